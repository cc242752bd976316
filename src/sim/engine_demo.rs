//! 演示模式
//!
//! 清掉背景流量后注入单个被跟踪的 packet；它结束（送达或丢弃）后恢复自动发包。
//! 目的节点由显式的 [`DestinationPolicy`] 决定。

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::engine::Engine;
use crate::net::{Network, NodeId};

/// 演示 packet 的目的节点选择策略
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationPolicy {
    /// 除源节点外随机选一个
    #[default]
    Random,
    /// 固定目的节点；节点不存在或等于源节点时不注入
    Fixed { node: NodeId },
    /// 源 id 带 `source_prefix` 前缀时，从 id 带 `destination_prefix` 前缀的节点中随机选；
    /// 不满足条件时退回随机选择
    PrefixGroup {
        source_prefix: String,
        destination_prefix: String,
    },
}

impl DestinationPolicy {
    pub fn choose<R: Rng + ?Sized>(
        &self,
        net: &Network,
        source: &NodeId,
        rng: &mut R,
    ) -> Option<NodeId> {
        let others: Vec<&NodeId> = net.node_ids().filter(|id| *id != source).collect();
        match self {
            DestinationPolicy::Random => others.choose(rng).map(|id| (*id).clone()),
            DestinationPolicy::Fixed { node } => {
                (node != source && net.contains_node(node)).then(|| node.clone())
            }
            DestinationPolicy::PrefixGroup {
                source_prefix,
                destination_prefix,
            } => {
                let group: Vec<&NodeId> = others
                    .iter()
                    .copied()
                    .filter(|id| id.as_str().starts_with(destination_prefix.as_str()))
                    .collect();
                if source.as_str().starts_with(source_prefix.as_str()) && !group.is_empty() {
                    group.choose(rng).map(|id| (*id).clone())
                } else {
                    others.choose(rng).map(|id| (*id).clone())
                }
            }
        }
    }
}

impl Engine {
    /// 演示注入：清空在途 packet 和所有非强制拥塞节点的队列，刷新路由，
    /// 关闭自动发包，然后从 `source` 注入一个被跟踪的 packet。
    ///
    /// 注入失败时恢复自动发包并返回 None。
    #[tracing::instrument(skip(self, policy), fields(source = %source))]
    pub fn inject_demo_packet(
        &mut self,
        source: &NodeId,
        policy: &DestinationPolicy,
    ) -> Option<u64> {
        if self.network.node_count() < 2 || !self.network.contains_node(source) {
            warn!("需要至少两个节点且源节点存在");
            return None;
        }

        info!("🎬 进入演示模式，清空背景流量");
        self.in_flight.clear();
        let thresholds = self.config.congestion;
        for node in self.network.nodes_mut() {
            if !node.is_force_congested() {
                node.queue.clear();
                node.update_congestion(thresholds);
            }
        }
        self.refresh_routing();
        self.auto_generate = false;

        let injected = policy
            .choose(&self.network, source, &mut self.rng)
            .and_then(|dst| self.generate_packet(source, &dst));
        match injected {
            Some(id) => {
                info!(pkt_id = id, "🎬 注入演示 packet");
                self.demo_packet = Some(id);
                Some(id)
            }
            None => {
                warn!("演示 packet 注入失败，恢复自动发包");
                self.auto_generate = true;
                None
            }
        }
    }
}
