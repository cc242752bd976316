//! 队列策略（Queue disciplines）
//!
//! 节点上只有一种队列：按 packet 个数计容量的 DropTail（尾丢弃）FIFO。
//! 队列满时拒绝新到达的元素，由调用方负责把被拒的 packet 标记为丢弃。

mod drop_tail;

pub use drop_tail::PacketQueue;

/// 节点队列默认容量（packet 个数）
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;
