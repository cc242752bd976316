//! 仿真引擎
//!
//! 单线程、按 tick 驱动：每次 `update(dt)` 依次完成发包、推进、到达处理、
//! 队列出队、拥塞重算、周期性路由刷新和统计。外部命令都是 `&mut self` 方法，
//! 天然落在 tick 边界上，不会与进行中的 tick 交错。

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use super::config::EngineConfig;
use super::stats::Statistics;
use super::time::SimTime;
use crate::net::{DropReason, Network, NodeId, Packet, PacketState, Position, QueueSlot};
use crate::routing::{RoutingAlgorithm, RoutingKind};

/// 仿真引擎：持有网络拓扑、路由策略与所有 packet 列表。
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) network: Network,
    pub(super) routing: Box<dyn RoutingAlgorithm>,
    pub(super) rng: StdRng,
    pub(super) running: bool,
    pub(super) now: SimTime,
    pub(super) speed: f64,
    pub(super) in_flight: Vec<Packet>,
    pub(super) delivered: Vec<Packet>,
    pub(super) dropped: Vec<Packet>,
    pub(super) auto_generate: bool,
    pub(super) demo_packet: Option<u64>,
    next_pkt_id: u64,
    total_generated: u64,
    delivered_latency_total: SimTime,
    last_generation: SimTime,
    last_refresh: SimTime,
}

impl Engine {
    /// 按配置中的路由策略创建引擎
    pub fn new(network: Network, config: EngineConfig) -> Self {
        let routing = config.routing.build(config.forced_congestion_multiplier);
        Self::with_routing(network, config, routing)
    }

    /// 使用指定路由策略创建引擎；创建时先刷新一次所有路由表
    pub fn with_routing(
        network: Network,
        config: EngineConfig,
        routing: Box<dyn RoutingAlgorithm>,
    ) -> Self {
        let mut engine = Self {
            rng: StdRng::seed_from_u64(config.seed),
            speed: config.clamp_speed(config.default_speed),
            auto_generate: config.auto_generate,
            config,
            network,
            routing,
            running: false,
            now: SimTime::ZERO,
            in_flight: Vec::new(),
            delivered: Vec::new(),
            dropped: Vec::new(),
            demo_packet: None,
            next_pkt_id: 0,
            total_generated: 0,
            delivered_latency_total: SimTime::ZERO,
            last_generation: SimTime::ZERO,
            last_refresh: SimTime::ZERO,
        };
        engine.update_congestion();
        engine.routing.refresh_tables(&mut engine.network);
        info!(
            network = %engine.network.name,
            nodes = engine.network.node_count(),
            links = engine.network.link_count(),
            routing = engine.routing.kind().as_str(),
            seed = engine.config.seed,
            "🛠️  仿真引擎已创建"
        );
        engine
    }

    pub fn start(&mut self) {
        info!(now = ?self.now, "▶️  开始仿真");
        self.running = true;
    }

    pub fn pause(&mut self) {
        info!(now = ?self.now, "⏸️  暂停仿真");
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 重置到初始状态：清空所有 packet、队列、计数与时钟，重新播种并刷新路由；
    /// 拓扑与强制拥塞标记保留
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) {
        info!("🔄 重置仿真");
        self.running = false;
        self.now = SimTime::ZERO;
        self.in_flight.clear();
        self.delivered.clear();
        self.dropped.clear();
        self.next_pkt_id = 0;
        self.total_generated = 0;
        self.delivered_latency_total = SimTime::ZERO;
        self.last_generation = SimTime::ZERO;
        self.last_refresh = SimTime::ZERO;
        self.auto_generate = self.config.auto_generate;
        self.demo_packet = None;
        self.rng = StdRng::seed_from_u64(self.config.seed);

        for node in self.network.nodes_mut() {
            node.queue.clear();
            node.counters = Default::default();
        }
        for link in self.network.links_mut() {
            link.packets_transmitted = 0;
            link.bytes_transmitted = 0;
        }
        self.network.stats = Default::default();
        self.update_congestion();
        self.routing.refresh_tables(&mut self.network);
    }

    /// 推进一个 tick。`delta_secs` 为 wall-clock 秒数，会乘以速度倍数。
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn update(&mut self, delta_secs: f64) {
        if !self.running {
            return;
        }

        let dt = SimTime::from_secs_f64(delta_secs * self.speed);
        self.now = self.now.saturating_add(dt);
        trace!(now = ?self.now, dt = ?dt, "推进仿真时钟");

        if self.auto_generate
            && self.now.saturating_sub(self.last_generation) >= self.config.generation_interval()
        {
            self.generate_random_packet();
            self.last_generation = self.now;
        }

        if let Some(demo) = self.demo_packet {
            if !self.in_flight.iter().any(|p| p.id == demo) {
                info!(pkt_id = demo, "🎬 演示 packet 已结束，恢复自动发包");
                self.demo_packet = None;
                self.auto_generate = true;
            }
        }

        self.advance_packets(dt.as_secs_f64());
        self.drain_queues();
        self.update_congestion();

        if self.now.saturating_sub(self.last_refresh) >= self.config.refresh_interval() {
            self.routing.refresh_tables(&mut self.network);
            self.last_refresh = self.now;
        }

        trace!(
            active = self.in_flight.len(),
            delivered = self.delivered.len(),
            dropped = self.dropped.len(),
            "tick 完成"
        );
    }

    /// 在两个不同的随机节点之间生成一个 packet（受在途上限约束）
    pub fn generate_random_packet(&mut self) -> Option<u64> {
        if self.network.node_count() < 2 {
            trace!("节点不足两个，跳过发包");
            return None;
        }
        if self.in_flight.len() >= self.config.max_in_flight {
            trace!(active = self.in_flight.len(), "在途 packet 达到上限，跳过发包");
            return None;
        }

        let ids: Vec<NodeId> = self.network.node_ids().cloned().collect();
        let src = ids.choose(&mut self.rng)?.clone();
        let others: Vec<&NodeId> = ids.iter().filter(|id| **id != src).collect();
        let dst = (*others.choose(&mut self.rng)?).clone();
        self.generate_packet(&src, &dst)
    }

    /// 生成 src -> dst 的 packet，返回其 id。
    ///
    /// 端点未知或 src == dst 时拒绝（不记录任何东西）；
    /// 找不到路由时 packet 直接进入丢弃列表，返回 None。
    #[tracing::instrument(skip(self), fields(src = %src, dst = %dst))]
    pub fn generate_packet(&mut self, src: &NodeId, dst: &NodeId) -> Option<u64> {
        if src == dst || !self.network.contains_node(src) || !self.network.contains_node(dst) {
            debug!("端点无效，拒绝生成 packet");
            return None;
        }

        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        let mut pkt = Packet::new(
            id,
            src.clone(),
            dst.clone(),
            self.config.packet_size_bytes,
            self.now,
        );

        let next = self
            .routing
            .route(&self.network, src, dst)
            .and_then(|route| route.get(1).cloned());
        let Some(next) = next else {
            warn!(pkt_id = id, "🚫 没有可用路由，packet 直接丢弃");
            pkt.mark_dropped(DropReason::NoRoute, self.now);
            self.dropped.push(pkt);
            return None;
        };

        debug!(pkt_id = id, next = %next, "📦 生成 packet");
        pkt.next_hop = Some(next);
        self.in_flight.push(pkt);
        self.total_generated += 1;
        self.network.stats.total_pkts += 1;
        if let Some(node) = self.network.node_mut(src) {
            node.counters.sent += 1;
        }
        Some(id)
    }

    /// 设置速度倍数（截断到配置的 [min, max]）
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = self.config.clamp_speed(speed);
        info!(speed = self.speed, "⏩ 设置仿真速度");
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn get_statistics(&self) -> Statistics {
        let delivered = self.delivered.len();
        let dropped = self.dropped.len();
        let completed = delivered + dropped;
        let delivery_rate = if completed > 0 {
            delivered as f64 / completed as f64
        } else {
            0.0
        };
        let average_latency_ms = if delivered > 0 {
            self.delivered_latency_total.as_millis_f64() / delivered as f64
        } else {
            0.0
        };
        Statistics {
            total_generated: self.total_generated,
            active: self.in_flight.len(),
            delivered,
            dropped,
            delivery_rate,
            average_latency_ms,
            simulation_time_s: self.now.as_secs_f64(),
        }
    }

    /// 立即刷新所有路由表
    pub fn refresh_routing(&mut self) {
        info!(now = ?self.now, "🧭 强制刷新路由表");
        self.routing.refresh_tables(&mut self.network);
        self.last_refresh = self.now;
    }

    /// 切换节点的强制拥塞标记，返回新状态；节点不存在时返回 None。
    ///
    /// 关闭时清空该节点队列（排队中的真实 packet 记为丢弃）。两种方向都会立即刷新路由。
    #[tracing::instrument(skip(self), fields(node = %id))]
    pub fn toggle_force_congestion(&mut self, id: &NodeId) -> Option<bool> {
        let node = self.network.node_mut(id)?;
        let on = !node.is_force_congested();
        node.set_force_congested(on);
        if on {
            node.fill_queue();
        } else {
            self.flush_queue(id);
        }
        info!(on, "🚧 切换强制拥塞");
        self.update_congestion();
        self.refresh_routing();
        Some(on)
    }

    /// 一次性把节点队列塞满（不设置强制标记，之后会正常出队），返回塞入个数
    #[tracing::instrument(skip(self), fields(node = %id))]
    pub fn congest_node(&mut self, id: &NodeId) -> Option<usize> {
        let node = self.network.node_mut(id)?;
        let added = node.fill_queue();
        info!(added, queue_len = node.queue.len(), "🚧 节点队列已塞满");
        self.update_congestion();
        self.refresh_routing();
        Some(added)
    }

    /// 清空节点队列；排队中的真实 packet 以 QueueFlushed 丢弃
    pub(super) fn flush_queue(&mut self, id: &NodeId) {
        let Some(node) = self.network.node_mut(id) else {
            return;
        };
        let slots = node.queue.clear();
        let waiting: HashSet<u64> = slots
            .into_iter()
            .filter_map(|slot| match slot {
                QueueSlot::Packet(pkt_id) => Some(pkt_id),
                QueueSlot::Filler => None,
            })
            .collect();
        if waiting.is_empty() {
            return;
        }
        let now = self.now;
        let mut flushed = 0u64;
        for pkt in self.in_flight.iter_mut().filter(|p| waiting.contains(&p.id)) {
            if pkt.mark_dropped(DropReason::QueueFlushed { node: id.clone() }, now) {
                flushed += 1;
            }
        }
        node.counters.dropped += flushed;
        debug!(node = %id, flushed, "队列已清空");
    }

    fn update_congestion(&mut self) {
        let thresholds = self.config.congestion;
        for node in self.network.nodes_mut() {
            node.update_congestion(thresholds);
        }
    }

    /// 推进所有在途 packet，处理到达，并把已完成的 packet 移入对应列表
    fn advance_packets(&mut self, dt_secs: f64) {
        let now = self.now;
        let grace = self.config.drop_grace();
        let mut finished: HashSet<u64> = HashSet::new();
        let queued = queued_packet_ids(&self.network);

        for pkt in self.in_flight.iter_mut() {
            match pkt.state() {
                PacketState::Delivered => {
                    finished.insert(pkt.id);
                    continue;
                }
                PacketState::Dropped => {
                    let at = pkt.finished_at.unwrap_or(now);
                    if now.saturating_sub(at) >= grace {
                        finished.insert(pkt.id);
                    }
                    continue;
                }
                PacketState::InFlight => {}
            }

            if let Some(reason) = stranded_reason(&self.network, pkt, &queued) {
                warn!(pkt_id = pkt.id, reason = %reason, "🚫 拓扑已变化，packet 无法继续");
                if pkt.mark_dropped(reason, now) {
                    if let Some(node) = self.network.node_mut(&pkt.current) {
                        node.counters.dropped += 1;
                    }
                }
                continue;
            }

            if !move_along_link(&self.network, &self.config, pkt, dt_secs) {
                continue;
            }
            if pkt.progress >= 1.0 {
                handle_arrival(&mut self.network, pkt, now);
            }
        }

        if finished.is_empty() {
            return;
        }
        let (done, keep): (Vec<Packet>, Vec<Packet>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|p| finished.contains(&p.id));
        self.in_flight = keep;

        for pkt in done {
            if pkt.is_delivered() {
                if let Some(latency) = pkt.latency() {
                    self.delivered_latency_total =
                        self.delivered_latency_total.saturating_add(latency);
                }
                self.network.stats.delivered_pkts += 1;
                self.delivered.push(pkt);
            } else {
                self.network.stats.dropped_pkts += 1;
                self.dropped.push(pkt);
            }
        }
    }

    /// 每个节点最多出队一个 packet（按概率），并为其解析下一跳
    fn drain_queues(&mut self) {
        let p = self.config.drain_probability();
        let ids: Vec<NodeId> = self.network.node_ids().cloned().collect();

        for id in ids {
            let Some(node) = self.network.node_mut(&id) else {
                continue;
            };
            if node.is_force_congested() {
                // 强制拥塞：保持队列满，不出队
                node.fill_queue();
                continue;
            }
            if node.queue.is_empty() {
                continue;
            }
            if !self.rng.gen_bool(p) {
                continue;
            }
            match node.queue.dequeue() {
                Some(QueueSlot::Packet(pkt_id)) => self.resolve_queued(&id, pkt_id),
                Some(QueueSlot::Filler) => trace!(node = %id, "丢弃占位元素"),
                None => {}
            }
        }
    }

    /// 为刚出队的 packet 解析下一跳；没有路由则丢弃
    fn resolve_queued(&mut self, at: &NodeId, pkt_id: u64) {
        let Some(idx) = self.in_flight.iter().position(|p| p.id == pkt_id) else {
            trace!(pkt_id, "出队的 packet 已不在在途列表");
            return;
        };
        let dst = self.in_flight[idx].dst.clone();
        let hop = self.lookup_next_hop(at, &dst);
        let now = self.now;

        let pkt = &mut self.in_flight[idx];
        match hop {
            Some(hop) => {
                debug!(pkt_id, at = %at, next = %hop, "📤 出队并转发");
                pkt.next_hop = Some(hop);
                pkt.progress = 0.0;
            }
            None => {
                warn!(pkt_id, at = %at, "🚫 排队节点没有可用路由");
                if pkt.mark_dropped(DropReason::NoRouteFromQueue { node: at.clone() }, now) {
                    if let Some(node) = self.network.node_mut(at) {
                        node.counters.dropped += 1;
                    }
                }
            }
        }
    }

    /// 优先查路由表；表项缺失或已失效时退回实时路由计算
    fn lookup_next_hop(&self, from: &NodeId, dst: &NodeId) -> Option<NodeId> {
        let node = self.network.node(from)?;
        if let Some(hop) = node.next_hop(dst) {
            if self.network.get_link_between(from, hop).is_some() {
                return Some(hop.clone());
            }
        }
        self.routing
            .route(&self.network, from, dst)
            .and_then(|route| route.get(1).cloned())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// 直接修改拓扑（外部命令）；之后的 tick 会基于新拓扑运行
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn routing(&self) -> &dyn RoutingAlgorithm {
        self.routing.as_ref()
    }

    pub fn routing_kind(&self) -> RoutingKind {
        self.routing.kind()
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn auto_generate(&self) -> bool {
        self.auto_generate
    }

    pub fn set_auto_generate(&mut self, on: bool) {
        self.auto_generate = on;
    }

    pub fn demo_packet(&self) -> Option<u64> {
        self.demo_packet
    }

    pub fn in_flight(&self) -> &[Packet] {
        &self.in_flight
    }

    pub fn delivered(&self) -> &[Packet] {
        &self.delivered
    }

    pub fn dropped(&self) -> &[Packet] {
        &self.dropped
    }

    /// 按 id 查找 packet（在途、已送达、已丢弃）
    pub fn packet(&self, id: u64) -> Option<&Packet> {
        self.in_flight
            .iter()
            .chain(self.delivered.iter())
            .chain(self.dropped.iter())
            .find(|p| p.id == id)
    }

    /// packet 当前位置：在当前节点与下一跳之间按进度线性插值
    pub fn packet_position(&self, pkt: &Packet) -> Option<Position> {
        let here = self.network.node(&pkt.current)?.position;
        let Some(next) = pkt.next_hop.as_ref().and_then(|n| self.network.node(n)) else {
            return Some(here);
        };
        Some(here.lerp(next.position, pkt.progress))
    }
}

/// 所有节点队列中真实 packet 的 id
fn queued_packet_ids(net: &Network) -> HashSet<u64> {
    net.nodes()
        .flat_map(|n| n.queue.iter())
        .filter_map(|slot| match slot {
            QueueSlot::Packet(id) => Some(*id),
            QueueSlot::Filler => None,
        })
        .collect()
}

/// 外部修改拓扑后 packet 是否已无法继续：所在节点被删、当前链路被删，
/// 或者等待出队却已不在任何队列里
fn stranded_reason(net: &Network, pkt: &Packet, queued: &HashSet<u64>) -> Option<DropReason> {
    if !net.contains_node(&pkt.current) {
        return Some(DropReason::NodeMissing {
            node: pkt.current.clone(),
        });
    }
    match &pkt.next_hop {
        Some(next) if !net.contains_node(next) => {
            Some(DropReason::NodeMissing { node: next.clone() })
        }
        Some(next) if net.get_link_between(&pkt.current, next).is_none() => {
            Some(DropReason::LinkMissing {
                from: pkt.current.clone(),
                to: next.clone(),
            })
        }
        Some(_) => None,
        None if queued.contains(&pkt.id) => None,
        None => Some(DropReason::QueueFlushed {
            node: pkt.current.clone(),
        }),
    }
}

/// 沿当前链路推进进度；packet 尚无下一跳或链路不存在时返回 false
fn move_along_link(net: &Network, config: &EngineConfig, pkt: &mut Packet, dt_secs: f64) -> bool {
    if dt_secs <= 0.0 {
        return false;
    }
    let Some(next) = pkt.next_hop.as_ref() else {
        return false;
    };
    let Some(link) = net.get_link_between(&pkt.current, next) else {
        return false;
    };
    let rate = config.traversal_rate(link.latency_ms);
    pkt.progress = if rate.is_finite() {
        (pkt.progress + rate * dt_secs).min(1.0)
    } else {
        1.0
    };
    true
}

/// 到达下一跳：目的地则送达，否则尝试在该节点入队（store-and-forward）
fn handle_arrival(net: &mut Network, pkt: &mut Packet, now: SimTime) {
    let from = pkt.current.clone();
    let Some(to) = pkt.next_hop.clone() else {
        return;
    };
    if let Some(link) = net.link_between_mut(&from, &to) {
        link.record_transmission(pkt.size_bytes);
    }
    pkt.advance();

    let Some(node) = net.node_mut(&pkt.current) else {
        pkt.mark_dropped(DropReason::NodeMissing { node: to }, now);
        return;
    };

    if pkt.current == pkt.dst {
        pkt.mark_delivered(now);
        node.counters.received += 1;
        info!(pkt_id = pkt.id, hops = pkt.hops_taken, "✅ 数据包送达目的地");
        return;
    }

    match node.queue.enqueue(QueueSlot::Packet(pkt.id)) {
        Ok(()) => {
            node.counters.forwarded += 1;
            debug!(
                pkt_id = pkt.id,
                node = %node.id,
                queue_len = node.queue.len(),
                "📥 到达中间节点并入队"
            );
        }
        Err(_) => {
            pkt.mark_dropped(DropReason::QueueFull { node: node.id.clone() }, now);
            node.counters.dropped += 1;
            debug!(pkt_id = pkt.id, node = %node.id, "🗑️ 队列已满，丢弃");
        }
    }
}
