//! 拓扑变更错误
//!
//! 所有变更操作在校验失败时拒绝执行并返回错误，网络状态保持不变。

use thiserror::Error;

use super::id::{LinkId, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("link {0} already exists")]
    DuplicateLink(LinkId),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown link {0}")]
    UnknownLink(LinkId),
    #[error("link {0} has a negative or non-finite latency")]
    InvalidLatency(LinkId),
}
