//! 路由引擎
//!
//! 两种可互换的路由策略共享同一个契约：
//! - `route(src, dst)`：返回从 src 到 dst（含两端）的节点序列，不可达返回 None；
//! - `refresh_tables()`：为每个节点重算到所有可达节点的下一跳。
//!
//! 每个策略只需实现单源搜索 [`RoutingAlgorithm::search`]，得到一棵路径树；
//! 单对路由和整表刷新都由这棵树导出。对同一个源，提前终止的单对搜索
//! 与完整搜索得到的父指针一致，因此整表刷新每个源只搜索一次。

mod adaptive;
mod flooding;
mod tree;

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::net::{Network, NodeId};

pub use adaptive::AdaptiveRouting;
pub use flooding::FloodingRouting;
pub use tree::PathTree;

/// 路由策略接口
pub trait RoutingAlgorithm: fmt::Debug + Send {
    fn kind(&self) -> RoutingKind;

    /// 单源搜索。`target` 为 Some 时允许在该节点确定后提前终止。
    /// source 不存在时返回 None。
    fn search(&self, net: &Network, source: &NodeId, target: Option<&NodeId>) -> Option<PathTree>;

    /// 计算 src -> dst 的路径；任一端不存在或不可达时返回 None。`route(x, x) == [x]`。
    fn route(&self, net: &Network, src: &NodeId, dst: &NodeId) -> Option<Vec<NodeId>> {
        if !net.contains_node(dst) {
            return None;
        }
        self.search(net, src, Some(dst))?.path_to(dst)
    }

    /// 基于当前（含拥塞）代价刷新所有节点的路由表
    #[tracing::instrument(skip(self, net), fields(algo = self.kind().as_str(), nodes = net.node_count()))]
    fn refresh_tables(&self, net: &mut Network) {
        // 先基于同一份快照算完所有表，再统一写回
        let tables: Vec<(NodeId, BTreeMap<NodeId, NodeId>)> = net
            .node_ids()
            .map(|src| {
                let table = self
                    .search(net, src, None)
                    .map(|tree| tree.next_hops())
                    .unwrap_or_default();
                (src.clone(), table)
            })
            .collect();

        let mut entries = 0usize;
        for (id, table) in tables {
            entries += table.len();
            if let Some(node) = net.node_mut(&id) {
                node.replace_routing_table(table);
            }
        }
        debug!(entries, "路由表已刷新");
    }
}

/// 路由策略选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RoutingKind {
    /// 拥塞自适应最短路（Dijkstra）
    #[default]
    Adaptive,
    /// 泛洪发现（BFS，忽略代价）
    Flooding,
}

impl RoutingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingKind::Adaptive => "adaptive",
            RoutingKind::Flooding => "flooding",
        }
    }

    /// 构造对应的路由策略；`forced_multiplier` 只对自适应策略有意义
    pub fn build(self, forced_multiplier: f64) -> Box<dyn RoutingAlgorithm> {
        info!(algo = self.as_str(), "🧭 创建路由策略");
        match self {
            RoutingKind::Adaptive => Box::new(AdaptiveRouting::new(forced_multiplier)),
            RoutingKind::Flooding => Box::new(FloodingRouting),
        }
    }
}
