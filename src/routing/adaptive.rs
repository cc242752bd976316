//! 拥塞自适应最短路（Dijkstra）
//!
//! 进入邻居 B 的代价 = link_weight(A, B) × congestion_multiplier(B)。
//! 倍数随 B 的队列占用从 1x 线性涨到 10x；强制拥塞的节点使用固定的最大倍数。
//! 路由表因此能自动绕开繁忙节点，节点之间不需要显式交换拥塞信号。

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::trace;

use super::tree::PathTree;
use super::{RoutingAlgorithm, RoutingKind};
use crate::net::{FORCED_CONGESTION_MULTIPLIER, Network, Node, NodeId, congestion_multiplier};

#[derive(Debug, Clone)]
pub struct AdaptiveRouting {
    forced_multiplier: f64,
}

impl Default for AdaptiveRouting {
    fn default() -> Self {
        Self::new(FORCED_CONGESTION_MULTIPLIER)
    }
}

impl AdaptiveRouting {
    pub fn new(forced_multiplier: f64) -> Self {
        Self { forced_multiplier }
    }

    /// 进入该节点的代价倍数
    pub fn multiplier(&self, node: &Node) -> f64 {
        congestion_multiplier(
            node.queue.len(),
            node.queue.capacity(),
            node.is_force_congested(),
            self.forced_multiplier,
        )
    }

    /// 计算一条路径在当前代价下的总代价；路径不连通时返回 None
    pub fn path_cost(&self, net: &Network, path: &[NodeId]) -> Option<f64> {
        let mut total = 0.0;
        for hop in path.windows(2) {
            let link = net.get_link_between(&hop[0], &hop[1])?;
            let node = net.node(&hop[1])?;
            total += link.weight() * self.multiplier(node);
        }
        Some(total)
    }
}

/// 优先队列条目。BinaryHeap 是 max-heap；我们需要最小代价优先，因此反向比较。
#[derive(Debug)]
struct Candidate {
    cost: f64,
    node: NodeId,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.cost.total_cmp(&other.cost) {
            Ordering::Equal => self.node.cmp(&other.node),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl RoutingAlgorithm for AdaptiveRouting {
    fn kind(&self) -> RoutingKind {
        RoutingKind::Adaptive
    }

    fn search(&self, net: &Network, source: &NodeId, target: Option<&NodeId>) -> Option<PathTree> {
        if !net.contains_node(source) {
            return None;
        }

        let mut tree = PathTree::new(source.clone());
        let mut dist: HashMap<NodeId, f64> = HashMap::new();
        let mut settled: HashSet<NodeId> = HashSet::new();
        let mut heap = BinaryHeap::new();

        dist.insert(source.clone(), 0.0);
        heap.push(Candidate {
            cost: 0.0,
            node: source.clone(),
        });

        while let Some(Candidate { cost, node }) = heap.pop() {
            if settled.contains(&node) {
                continue;
            }
            settled.insert(node.clone());
            if target == Some(&node) {
                break;
            }

            for nb in net.neighbors(&node) {
                if settled.contains(nb) {
                    continue;
                }
                let (Some(link), Some(nb_node)) = (net.get_link_between(&node, nb), net.node(nb))
                else {
                    continue;
                };
                let next = cost + link.weight() * self.multiplier(nb_node);
                let best = dist.get(nb).copied().unwrap_or(f64::INFINITY);
                if next < best {
                    trace!(from = %node, to = %nb, cost = next, "松弛");
                    dist.insert(nb.clone(), next);
                    tree.set_parent(nb.clone(), node.clone());
                    heap.push(Candidate {
                        cost: next,
                        node: nb.clone(),
                    });
                }
            }
        }

        Some(tree)
    }
}
