//! 仿真核心模块
//!
//! 此模块包含按 tick 驱动的仿真引擎、仿真时间、配置与统计。

// 子模块声明
mod config;
mod engine;
mod engine_demo;
mod engine_viz;
mod stats;
mod time;

// 重新导出公共接口
pub use config::EngineConfig;
pub use engine::Engine;
pub use engine_demo::DestinationPolicy;
pub use stats::Statistics;
pub use time::SimTime;
