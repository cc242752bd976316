//! 拓扑文件读取、校验与构建

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::error::TopologyError;
use super::line::default_topology;
use super::spec::{TopologyDocument, TopologySpec};
use crate::net::{Link, Network, Node, Position};

/// 解析拓扑文档；至少需要一个拓扑
pub fn parse_document(raw: &str) -> Result<TopologyDocument, TopologyError> {
    let doc: TopologyDocument = serde_json::from_str(raw)?;
    if doc.topologies.is_empty() {
        return Err(TopologyError::Empty);
    }
    Ok(doc)
}

/// 从文件读取拓扑文档
pub fn read_document(path: &Path) -> Result<TopologyDocument, TopologyError> {
    let raw = fs::read_to_string(path).map_err(|source| TopologyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&raw)
}

/// 按描述构建网络；重复 id、引用未知节点或时延非法的链路会使整个拓扑被拒绝
pub fn build_network(spec: &TopologySpec, queue_capacity: usize) -> Result<Network, TopologyError> {
    let invalid = |source| TopologyError::Invalid {
        name: spec.name.clone(),
        source,
    };

    let mut net = Network::new(spec.name.clone());
    for n in &spec.nodes {
        let mut node = Node::with_capacity(
            n.id.as_str(),
            n.kind,
            Position::from(n.position),
            queue_capacity,
        );
        if let Some(name) = &n.name {
            node = node.named(name.clone());
        }
        net.add_node(node).map_err(invalid)?;
    }
    for l in &spec.links {
        let mut link = Link::new(l.id.as_str(), l.source.as_str(), l.target.as_str())
            .with_latency(l.latency)
            .with_bandwidth(l.bandwidth);
        if !l.bidirectional {
            link = link.one_way();
        }
        net.add_link(link).map_err(invalid)?;
    }

    info!(
        topology = %spec.name,
        nodes = net.node_count(),
        links = net.link_count(),
        "🗺️  拓扑已构建"
    );
    Ok(net)
}

/// 构建选中的拓扑；没有选中或构建失败时退回内置默认拓扑
pub fn load_or_default(spec: Option<&TopologySpec>, queue_capacity: usize) -> Network {
    let Some(spec) = spec else {
        warn!("没有可用的拓扑描述，使用默认拓扑");
        return default_topology(queue_capacity);
    };
    match build_network(spec, queue_capacity) {
        Ok(net) => net,
        Err(err) => {
            warn!(error = %err, "拓扑无效，使用默认拓扑");
            default_topology(queue_capacity)
        }
    }
}
