//! 单源路径树

use std::collections::{BTreeMap, HashMap};

use crate::net::NodeId;

/// 单源搜索的结果：每个已发现节点指向其前驱。
#[derive(Debug, Clone)]
pub struct PathTree {
    source: NodeId,
    parent: HashMap<NodeId, NodeId>,
}

impl PathTree {
    pub fn new(source: NodeId) -> Self {
        Self {
            source,
            parent: HashMap::new(),
        }
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub(crate) fn set_parent(&mut self, node: NodeId, parent: NodeId) {
        self.parent.insert(node, parent);
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        node == &self.source || self.parent.contains_key(node)
    }

    /// 回溯得到 source -> dst 的路径
    pub fn path_to(&self, dst: &NodeId) -> Option<Vec<NodeId>> {
        if dst == &self.source {
            return Some(vec![self.source.clone()]);
        }
        let mut path = vec![dst.clone()];
        let mut cur = dst;
        while let Some(prev) = self.parent.get(cur) {
            path.push(prev.clone());
            if prev == &self.source {
                path.reverse();
                return Some(path);
            }
            cur = prev;
        }
        None
    }

    /// 路径上的第一跳（dst 为 source 本身时没有第一跳）
    pub fn first_hop(&self, dst: &NodeId) -> Option<NodeId> {
        let path = self.path_to(dst)?;
        path.get(1).cloned()
    }

    /// 导出下一跳表：destination -> next hop
    pub fn next_hops(&self) -> BTreeMap<NodeId, NodeId> {
        self.parent
            .keys()
            .filter_map(|dst| self.first_hop(dst).map(|hop| (dst.clone(), hop)))
            .collect()
    }
}
