//! 引擎统计快照

use serde::Serialize;

/// `Engine::get_statistics` 的返回值
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub total_generated: u64,
    /// 仍在引擎在途列表里的 packet（含排队中与宽限期内已丢弃的）
    pub active: usize,
    pub delivered: usize,
    pub dropped: usize,
    /// delivered / (delivered + dropped)，尚无完成的包时为 0
    pub delivery_rate: f64,
    /// 已送达包的平均端到端时延（仿真毫秒）
    pub average_latency_ms: f64,
    /// 仿真时间（秒）
    pub simulation_time_s: f64,
}
