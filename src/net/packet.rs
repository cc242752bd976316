//! 数据包类型
//!
//! 定义网络数据包及其生命周期：in-flight → delivered / dropped（终态，只进入一次）。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::NodeId;
use crate::sim::SimTime;

/// 数据包状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketState {
    InFlight,
    Delivered,
    Dropped,
}

/// 丢包原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// 生成时找不到路由
    NoRoute,
    /// 从排队节点重新选路时找不到路由
    NoRouteFromQueue { node: NodeId },
    /// 到达节点时队列已满
    QueueFull { node: NodeId },
    /// 排队中被清空（强制拥塞解除、演示注入等命令）
    QueueFlushed { node: NodeId },
    /// 所在节点或下一跳节点已不在拓扑中
    NodeMissing { node: NodeId },
    /// 正在穿越的链路已被删除
    LinkMissing { from: NodeId, to: NodeId },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NoRoute => f.write_str("no route available"),
            DropReason::NoRouteFromQueue { node } => {
                write!(f, "no route from queued node {node}")
            }
            DropReason::QueueFull { node } => write!(f, "queue full at node {node}"),
            DropReason::QueueFlushed { node } => write!(f, "queue flushed at node {node}"),
            DropReason::NodeMissing { node } => write!(f, "node {node} not found"),
            DropReason::LinkMissing { from, to } => write!(f, "link {from} -> {to} not found"),
        }
    }
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub size_bytes: u32,
    /// 当前所在节点
    pub current: NodeId,
    /// 已解析的下一跳；None 表示还在排队（或刚生成未选路）
    pub next_hop: Option<NodeId>,
    /// 已走过的路径（含源节点）
    pub path: Vec<NodeId>,
    pub created_at: SimTime,
    /// 送达或丢弃的时刻
    pub finished_at: Option<SimTime>,
    pub hops_taken: u32,
    /// 在当前链路上的进度，[0, 1]
    pub progress: f64,
    state: PacketState,
    drop_reason: Option<DropReason>,
}

impl Packet {
    pub fn new(id: u64, src: NodeId, dst: NodeId, size_bytes: u32, now: SimTime) -> Self {
        Self {
            id,
            current: src.clone(),
            path: vec![src.clone()],
            src,
            dst,
            size_bytes,
            next_hop: None,
            created_at: now,
            finished_at: None,
            hops_taken: 0,
            progress: 0.0,
            state: PacketState::InFlight,
            drop_reason: None,
        }
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == PacketState::InFlight
    }

    pub fn is_delivered(&self) -> bool {
        self.state == PacketState::Delivered
    }

    pub fn is_dropped(&self) -> bool {
        self.state == PacketState::Dropped
    }

    pub fn drop_reason(&self) -> Option<&DropReason> {
        self.drop_reason.as_ref()
    }

    /// 前进到已解析的下一跳。没有下一跳（或已是终态）时返回 false 且不做任何修改。
    pub fn advance(&mut self) -> bool {
        if !self.is_in_flight() {
            return false;
        }
        let Some(next) = self.next_hop.take() else {
            return false;
        };
        self.current = next.clone();
        self.path.push(next);
        self.hops_taken += 1;
        self.progress = 0.0;
        true
    }

    /// 标记为已送达；已处于终态时返回 false。
    pub fn mark_delivered(&mut self, now: SimTime) -> bool {
        if !self.is_in_flight() {
            return false;
        }
        self.state = PacketState::Delivered;
        self.finished_at = Some(now);
        true
    }

    /// 标记为已丢弃；已处于终态时返回 false。
    pub fn mark_dropped(&mut self, reason: DropReason, now: SimTime) -> bool {
        if !self.is_in_flight() {
            return false;
        }
        self.state = PacketState::Dropped;
        self.drop_reason = Some(reason);
        self.next_hop = None;
        self.finished_at = Some(now);
        true
    }

    /// 端到端时延（仅对已送达的包有意义）
    pub fn latency(&self) -> Option<SimTime> {
        if !self.is_delivered() {
            return None;
        }
        self.finished_at.map(|t| t.saturating_sub(self.created_at))
    }
}
