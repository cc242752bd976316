//! 引擎配置
//!
//! 所有可调参数集中在这里。分层：内置默认值 ← 拓扑文件中的 `engine` 段 ← 命令行参数。

use serde::{Deserialize, Serialize};

use super::time::SimTime;
use crate::net::{CongestionThresholds, FORCED_CONGESTION_MULTIPLIER};
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::routing::RoutingKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub routing: RoutingKind,
    /// 新建节点的队列容量（packet 个数）
    pub queue_capacity: usize,
    pub default_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// 自动发包间隔（仿真秒）
    pub generation_interval_s: f64,
    /// 路由表刷新间隔（仿真秒）
    pub refresh_interval_s: f64,
    /// 丢弃的包在移除前保留的时间（仿真秒），供可视化展示
    pub drop_grace_s: f64,
    /// 同时在途的 packet 上限（超过则跳过自动发包）
    pub max_in_flight: usize,
    pub packet_size_bytes: u32,
    /// 非空队列每 tick 出队一个 packet 的概率
    pub drain_probability: f64,
    /// 链路推进速度：progress += base_speed / (latency / latency_normalization) × dt
    pub base_speed: f64,
    pub latency_normalization_ms: f64,
    pub forced_congestion_multiplier: f64,
    pub congestion: CongestionThresholds,
    pub auto_generate: bool,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            routing: RoutingKind::Adaptive,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            default_speed: 1.0,
            min_speed: 0.0,
            max_speed: 10.0,
            generation_interval_s: 0.5,
            refresh_interval_s: 0.5,
            drop_grace_s: 0.5,
            max_in_flight: 50,
            packet_size_bytes: 1500,
            drain_probability: 0.05,
            base_speed: 0.5,
            latency_normalization_ms: 10.0,
            forced_congestion_multiplier: FORCED_CONGESTION_MULTIPLIER,
            congestion: CongestionThresholds::default(),
            auto_generate: true,
            seed: 0,
        }
    }
}

impl EngineConfig {
    pub fn generation_interval(&self) -> SimTime {
        SimTime::from_secs_f64(self.generation_interval_s)
    }

    pub fn refresh_interval(&self) -> SimTime {
        SimTime::from_secs_f64(self.refresh_interval_s)
    }

    pub fn drop_grace(&self) -> SimTime {
        SimTime::from_secs_f64(self.drop_grace_s)
    }

    /// 出队概率，截断到 [0, 1]
    pub fn drain_probability(&self) -> f64 {
        if self.drain_probability.is_nan() {
            return 0.0;
        }
        self.drain_probability.clamp(0.0, 1.0)
    }

    /// 把速度截断到 [min_speed, max_speed]
    pub fn clamp_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return self.min_speed;
        }
        speed.max(self.min_speed).min(self.max_speed)
    }

    /// 每仿真秒的链路进度增量；时延为 0 时返回无穷大（一次走完）
    pub fn traversal_rate(&self, latency_ms: f64) -> f64 {
        if latency_ms <= 0.0 || self.latency_normalization_ms <= 0.0 {
            return f64::INFINITY;
        }
        self.base_speed / (latency_ms / self.latency_normalization_ms)
    }
}
