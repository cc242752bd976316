//! 可视化快照（用于离线回放）
//!
//! 外部渲染器读取按 tick 采样的 JSON 帧；帧是引擎状态的拷贝，渲染层不会反向修改核心。

mod types;

pub use types::{VizFrame, VizLink, VizLogger, VizNode, VizPacket};
