//! 网络拓扑管理
//!
//! 定义网络拓扑结构：节点集合、链路集合与聚合统计。
//! 邻接表只在增删链路时增量更新，从不整体重算。

use std::collections::BTreeMap;

use super::error::NetError;
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::node::Node;
use super::stats::Stats;
use tracing::{debug, trace};

/// 网络拓扑
#[derive(Debug, Default, Clone)]
pub struct Network {
    pub name: String,
    nodes: BTreeMap<NodeId, Node>,
    links: BTreeMap<LinkId, Link>,
    pub stats: Stats,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 添加节点；id 重复时拒绝
    pub fn add_node(&mut self, node: Node) -> Result<(), NetError> {
        if self.nodes.contains_key(&node.id) {
            return Err(NetError::DuplicateNode(node.id));
        }
        debug!(node = %node.id, kind = node.kind.as_str(), "➕ 添加节点");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// 删除节点，同时删除所有与其相连的链路，并更新两端邻接表
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, NetError> {
        if !self.nodes.contains_key(id) {
            return Err(NetError::UnknownNode(id.clone()));
        }
        let incident: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.contains(id))
            .map(|l| l.id.clone())
            .collect();
        trace!(node = %id, incident = incident.len(), "级联删除链路");
        for link_id in &incident {
            // 只收集了存在的 id，这里不会失败
            let _ = self.remove_link(link_id);
        }
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| NetError::UnknownNode(id.clone()))?;
        debug!(node = %id, "➖ 删除节点");
        Ok(node)
    }

    /// 添加链路；任一端点不存在、链路 id 重复或时延为负/非有限值时拒绝
    pub fn add_link(&mut self, link: Link) -> Result<(), NetError> {
        if self.links.contains_key(&link.id) {
            return Err(NetError::DuplicateLink(link.id));
        }
        if !link.latency_ms.is_finite() || link.latency_ms < 0.0 {
            return Err(NetError::InvalidLatency(link.id));
        }
        for end in [&link.source, &link.target] {
            if !self.nodes.contains_key(end) {
                return Err(NetError::UnknownNode(end.clone()));
            }
        }

        if let Some(src) = self.nodes.get_mut(&link.source) {
            src.add_neighbor(&link.target);
        }
        if link.bidirectional {
            if let Some(dst) = self.nodes.get_mut(&link.target) {
                dst.add_neighbor(&link.source);
            }
        }
        debug!(
            link = %link.id,
            source = %link.source,
            target = %link.target,
            latency_ms = link.latency_ms,
            bidirectional = link.bidirectional,
            "🔗 添加链路"
        );
        self.links.insert(link.id.clone(), link);
        Ok(())
    }

    /// 删除链路并更新邻接表；若仍有其他链路连接同一方向则保留邻居
    pub fn remove_link(&mut self, id: &LinkId) -> Result<Link, NetError> {
        let link = self
            .links
            .remove(id)
            .ok_or_else(|| NetError::UnknownLink(id.clone()))?;

        if !self.has_path_edge(&link.source, &link.target) {
            if let Some(src) = self.nodes.get_mut(&link.source) {
                src.remove_neighbor(&link.target);
            }
        }
        if link.bidirectional && !self.has_path_edge(&link.target, &link.source) {
            if let Some(dst) = self.nodes.get_mut(&link.target) {
                dst.remove_neighbor(&link.source);
            }
        }
        debug!(link = %id, "✂️  删除链路");
        Ok(link)
    }

    fn has_path_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        self.links.values().any(|l| l.connects(from, to))
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn link_mut(&mut self, id: &LinkId) -> Option<&mut Link> {
        self.links.get_mut(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// 查找两节点之间的链路：精确匹配，或双向链路的反向匹配
    pub fn get_link_between(&self, a: &NodeId, b: &NodeId) -> Option<&Link> {
        self.links.values().find(|l| l.connects(a, b))
    }

    pub(crate) fn link_between_mut(&mut self, a: &NodeId, b: &NodeId) -> Option<&mut Link> {
        self.links.values_mut().find(|l| l.connects(a, b))
    }

    /// 邻居列表；节点不存在时返回空
    pub fn neighbors(&self, id: &NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.neighbors()).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.values_mut()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// 清空所有节点、链路，并重置聚合统计
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.stats = Stats::default();
    }
}
