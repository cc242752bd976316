//! 网络拓扑模块
//!
//! 此模块包含拓扑数据模型：节点、链路、数据包，以及维护一致性的 Network。

// 子模块声明
mod congestion;
mod error;
mod id;
mod link;
mod network;
mod node;
mod packet;
mod stats;

// 重新导出公共接口
pub use congestion::{
    CongestionLevel, CongestionThresholds, FORCED_CONGESTION_MULTIPLIER, congestion_multiplier,
};
pub use error::NetError;
pub use id::{LinkId, NodeId};
pub use link::{DEFAULT_BANDWIDTH_MBPS, DEFAULT_LATENCY_MS, Link};
pub use network::Network;
pub use node::{Node, NodeCounters, NodeKind, Position, QueueSlot};
pub use packet::{DropReason, Packet, PacketState};
pub use stats::Stats;
