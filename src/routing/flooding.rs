//! 泛洪发现路由（BFS）
//!
//! 忽略链路代价与拥塞，返回最先发现的（跳数最少的）路径，作为不感知拥塞的基线。

use std::collections::{HashSet, VecDeque};

use super::tree::PathTree;
use super::{RoutingAlgorithm, RoutingKind};
use crate::net::{Network, NodeId};

#[derive(Debug, Clone, Copy, Default)]
pub struct FloodingRouting;

impl RoutingAlgorithm for FloodingRouting {
    fn kind(&self) -> RoutingKind {
        RoutingKind::Flooding
    }

    fn search(&self, net: &Network, source: &NodeId, target: Option<&NodeId>) -> Option<PathTree> {
        if !net.contains_node(source) {
            return None;
        }

        let mut tree = PathTree::new(source.clone());
        let mut visited: HashSet<NodeId> = HashSet::from([source.clone()]);
        let mut q: VecDeque<NodeId> = VecDeque::from([source.clone()]);

        if target == Some(source) {
            return Some(tree);
        }

        while let Some(v) = q.pop_front() {
            for nb in net.neighbors(&v) {
                if !visited.insert(nb.clone()) {
                    continue;
                }
                tree.set_parent(nb.clone(), v.clone());
                if target == Some(nb) {
                    return Some(tree);
                }
                q.push_back(nb.clone());
            }
        }

        Some(tree)
    }
}
