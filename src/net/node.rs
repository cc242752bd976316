//! 节点类型
//!
//! 定义网络节点：位置、邻接表、路由表、排队队列、拥塞状态与统计计数。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::congestion::{CongestionLevel, CongestionThresholds};
use super::id::NodeId;
use crate::queue::{DEFAULT_QUEUE_CAPACITY, PacketQueue};

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Router,
    Switch,
    Host,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Router => "router",
            NodeKind::Switch => "switch",
            NodeKind::Host => "host",
        }
    }
}

/// 三维坐标
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 线性插值：t=0 返回 self，t=1 返回 other
    pub fn lerp(self, other: Position, t: f64) -> Position {
        let t = t.clamp(0.0, 1.0);
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

impl From<[f64; 3]> for Position {
    fn from(p: [f64; 3]) -> Self {
        Position::new(p[0], p[1], p[2])
    }
}

/// 节点队列中的元素：真实 packet 只存 id；Filler 是拥塞命令塞进去的占位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSlot {
    Packet(u64),
    Filler,
}

/// 节点累计计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounters {
    pub sent: u64,
    pub received: u64,
    pub forwarded: u64,
    pub dropped: u64,
}

/// 网络节点
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub queue: PacketQueue<QueueSlot>,
    pub counters: NodeCounters,
    neighbors: Vec<NodeId>,
    routing_table: BTreeMap<NodeId, NodeId>,
    congestion: CongestionLevel,
    force_congested: bool,
}

impl Node {
    /// 创建新节点（默认队列容量）
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Position) -> Self {
        Self::with_capacity(id, kind, position, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        id: impl Into<NodeId>,
        kind: NodeKind,
        position: Position,
        queue_capacity: usize,
    ) -> Self {
        let id = id.into();
        Self {
            name: format!("{}_{}", kind.as_str(), id),
            id,
            kind,
            position,
            queue: PacketQueue::new(queue_capacity),
            counters: NodeCounters::default(),
            neighbors: Vec::new(),
            routing_table: BTreeMap::new(),
            congestion: CongestionLevel::Low,
            force_congested: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// 邻接表由 Network 在增删链路时增量维护
    pub(crate) fn add_neighbor(&mut self, id: &NodeId) {
        if !self.neighbors.contains(id) {
            self.neighbors.push(id.clone());
        }
    }

    pub(crate) fn remove_neighbor(&mut self, id: &NodeId) {
        self.neighbors.retain(|n| n != id);
    }

    pub fn next_hop(&self, dst: &NodeId) -> Option<&NodeId> {
        self.routing_table.get(dst)
    }

    pub fn routing_table(&self) -> &BTreeMap<NodeId, NodeId> {
        &self.routing_table
    }

    pub(crate) fn replace_routing_table(&mut self, table: BTreeMap<NodeId, NodeId>) {
        self.routing_table = table;
    }

    pub fn congestion(&self) -> CongestionLevel {
        self.congestion
    }

    /// 根据当前队列占用重新计算拥塞等级
    pub fn update_congestion(&mut self, thresholds: CongestionThresholds) -> CongestionLevel {
        self.congestion = CongestionLevel::classify(
            self.queue.len(),
            self.queue.capacity(),
            self.force_congested,
            thresholds,
        );
        self.congestion
    }

    pub fn is_force_congested(&self) -> bool {
        self.force_congested
    }

    pub fn set_force_congested(&mut self, on: bool) {
        self.force_congested = on;
    }

    /// 用 Filler 把队列塞满，返回塞入的个数
    pub fn fill_queue(&mut self) -> usize {
        let mut added = 0;
        while !self.queue.is_full() && self.queue.enqueue(QueueSlot::Filler).is_ok() {
            added += 1;
        }
        added
    }

    /// 队列中排队的真实 packet 个数
    pub fn queued_packets(&self) -> usize {
        self.queue
            .iter()
            .filter(|slot| matches!(slot, QueueSlot::Packet(_)))
            .count()
    }
}
