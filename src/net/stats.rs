//! 统计信息
//!
//! 定义网络级的数据包聚合计数。

use serde::Serialize;

/// 网络统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_pkts: u64,
    pub delivered_pkts: u64,
    pub dropped_pkts: u64,
}
