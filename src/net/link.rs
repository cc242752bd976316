//! 链路类型
//!
//! 定义网络链路。链路时延同时作为路由权重。

use super::id::{LinkId, NodeId};

pub const DEFAULT_BANDWIDTH_MBPS: f64 = 100.0;
pub const DEFAULT_LATENCY_MS: f64 = 10.0;

/// 网络链路
#[derive(Debug, Clone)]
pub struct Link {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub bandwidth_mbps: f64,
    pub latency_ms: f64,
    pub bidirectional: bool,
    pub packets_transmitted: u64,
    pub bytes_transmitted: u64,
}

impl Link {
    /// 创建新链路（默认双向、100 Mbps、10 ms）
    pub fn new(id: impl Into<LinkId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            bandwidth_mbps: DEFAULT_BANDWIDTH_MBPS,
            latency_ms: DEFAULT_LATENCY_MS,
            bidirectional: true,
            packets_transmitted: 0,
            bytes_transmitted: 0,
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_bandwidth(mut self, bandwidth_mbps: f64) -> Self {
        self.bandwidth_mbps = bandwidth_mbps;
        self
    }

    pub fn one_way(mut self) -> Self {
        self.bidirectional = false;
        self
    }

    /// 路由权重（基于时延）
    pub fn weight(&self) -> f64 {
        self.latency_ms
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }

    /// 是否可以从 from 走到 to
    pub fn connects(&self, from: &NodeId, to: &NodeId) -> bool {
        (&self.source == from && &self.target == to)
            || (self.bidirectional && &self.source == to && &self.target == from)
    }

    /// 给定一端，返回可达的另一端
    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if node == &self.source {
            Some(&self.target)
        } else if node == &self.target && self.bidirectional {
            Some(&self.source)
        } else {
            None
        }
    }

    pub(crate) fn record_transmission(&mut self, bytes: u32) {
        self.packets_transmitted = self.packets_transmitted.saturating_add(1);
        self.bytes_transmitted = self.bytes_transmitted.saturating_add(bytes as u64);
    }
}
