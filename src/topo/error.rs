//! 拓扑加载错误

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::net::NetError;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed topology document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("topology document contains no topologies")]
    Empty,
    #[error("topology {name:?}: {source}")]
    Invalid {
        name: String,
        #[source]
        source: NetError,
    },
}
