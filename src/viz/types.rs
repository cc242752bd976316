use serde::{Deserialize, Serialize};

use crate::net::{CongestionLevel, NodeCounters, NodeKind, PacketState, Position};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub queue_len: usize,
    pub queue_cap: usize,
    pub congestion: CongestionLevel,
    pub force_congested: bool,
    pub counters: NodeCounters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub bidirectional: bool,
    /// 链路时延（ms）
    pub latency_ms: f64,
    /// 链路带宽（Mbps）
    pub bandwidth_mbps: f64,
    pub packets_transmitted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizPacket {
    pub id: u64,
    pub src: String,
    pub dst: String,
    pub current: String,
    /// None 表示在当前节点排队
    pub next_hop: Option<String>,
    pub progress: f64,
    pub position: Option<Position>,
    pub state: PacketState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_reason: Option<String>,
}

/// 一帧（某个 tick 结束时的可观察状态）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizFrame {
    /// 仿真时间（秒）
    pub t_s: f64,
    pub nodes: Vec<VizNode>,
    pub links: Vec<VizLink>,
    pub packets: Vec<VizPacket>,
    pub total_generated: u64,
    pub delivered: usize,
    pub dropped: usize,
    pub delivery_rate: f64,
    pub average_latency_ms: f64,
}

/// 一个简单的帧收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub frames: Vec<VizFrame>,
}

impl VizLogger {
    pub fn push(&mut self, frame: VizFrame) {
        self.frames.push(frame);
    }
}
