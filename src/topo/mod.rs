//! 拓扑描述与加载
//!
//! 拓扑文件（JSON）描述一个或多个命名拓扑；加载失败时退回内置默认拓扑，
//! 核心只会拿到校验通过的 `Network`。

mod error;
mod line;
mod load;
mod spec;

pub use error::TopologyError;
pub use line::{LineOpts, build_line, default_topology};
pub use load::{build_network, load_or_default, parse_document, read_document};
pub use spec::{LinkSpec, NodeSpec, TopologyDocument, TopologySpec};
