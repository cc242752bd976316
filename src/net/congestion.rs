//! 拥塞分级与拥塞代价
//!
//! 两个函数都是纯函数：只看 (队列占用, 队列容量, 强制拥塞标记)，没有隐藏状态。

use serde::{Deserialize, Serialize};

/// 节点拥塞等级（按队列占用分桶）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// 拥塞分桶阈值（单位：队列中的 packet 个数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CongestionThresholds {
    /// occupancy >= medium 视为 Medium
    pub medium: usize,
    /// occupancy > high 视为 High
    pub high: usize,
}

impl Default for CongestionThresholds {
    fn default() -> Self {
        Self { medium: 4, high: 6 }
    }
}

impl CongestionLevel {
    /// 根据队列占用计算拥塞等级。
    ///
    /// 强制拥塞的节点总是 High；容量非零且已满的队列也总是 High，
    /// 避免小队列在阈值之下“满而不红”。
    pub fn classify(
        occupancy: usize,
        capacity: usize,
        forced: bool,
        thresholds: CongestionThresholds,
    ) -> Self {
        if forced {
            return CongestionLevel::High;
        }
        if capacity > 0 && occupancy >= capacity {
            return CongestionLevel::High;
        }
        if occupancy > thresholds.high {
            CongestionLevel::High
        } else if occupancy >= thresholds.medium {
            CongestionLevel::Medium
        } else {
            CongestionLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CongestionLevel::Low => "low",
            CongestionLevel::Medium => "medium",
            CongestionLevel::High => "high",
        }
    }
}

/// 强制拥塞节点的固定代价倍数
pub const FORCED_CONGESTION_MULTIPLIER: f64 = 99.0;

/// 进入某节点的代价倍数：空队列 1x，线性增长到满队列 10x（超出容量按满计）。
pub fn congestion_multiplier(
    occupancy: usize,
    capacity: usize,
    forced: bool,
    forced_multiplier: f64,
) -> f64 {
    if forced {
        return forced_multiplier;
    }
    if capacity == 0 {
        return 1.0;
    }
    let fill = (occupancy as f64 / capacity as f64).min(1.0);
    1.0 + 9.0 * fill
}
