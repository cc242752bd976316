use serde::{Deserialize, Serialize};

use crate::net::{DEFAULT_BANDWIDTH_MBPS, DEFAULT_LATENCY_MS, NodeKind};
use crate::sim::EngineConfig;

/// 拓扑文件顶层结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDocument {
    pub topologies: Vec<TopologySpec>,
    /// 可选的引擎配置覆盖
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}

impl TopologyDocument {
    /// 按下标选择拓扑（越界时回绕，便于循环切换）
    pub fn by_index(&self, index: usize) -> Option<&TopologySpec> {
        if self.topologies.is_empty() {
            return None;
        }
        self.topologies.get(index % self.topologies.len())
    }

    pub fn by_name(&self, name: &str) -> Option<&TopologySpec> {
        self.topologies.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub position: [f64; 3],
    #[serde(default, rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub id: String,
    pub source: String,
    pub target: String,
    /// 带宽（Mbps）
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    /// 时延（ms）
    #[serde(default = "default_latency")]
    pub latency: f64,
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

fn default_bandwidth() -> f64 {
    DEFAULT_BANDWIDTH_MBPS
}

fn default_latency() -> f64 {
    DEFAULT_LATENCY_MS
}

fn default_bidirectional() -> bool {
    true
}
