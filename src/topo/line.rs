//! 线形拓扑构建（也是内置默认拓扑）

use crate::net::{Link, Network, Node, NodeId, NodeKind, Position};

/// 线形拓扑配置选项
#[derive(Debug, Clone)]
pub struct LineOpts {
    /// 节点 id，按顺序相连
    pub ids: Vec<String>,
    pub spacing: f64,
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
    pub queue_capacity: usize,
}

impl Default for LineOpts {
    fn default() -> Self {
        Self {
            ids: vec!["A".into(), "B".into(), "C".into()],
            spacing: 3.0,
            latency_ms: 10.0,
            bandwidth_mbps: 100.0,
            queue_capacity: crate::queue::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// 构建线形拓扑
///
/// 拓扑结构：A <-> B <-> C（链路 id 为两端 id 拼接，如 "AB"）
/// 返回：(网络, 节点序列)
pub fn build_line(name: impl Into<String>, opts: &LineOpts) -> (Network, Vec<NodeId>) {
    let mut net = Network::new(name);
    let offset = (opts.ids.len().saturating_sub(1)) as f64 * opts.spacing / 2.0;

    let mut ids = Vec::with_capacity(opts.ids.len());
    for (i, id) in opts.ids.iter().enumerate() {
        let pos = Position::new(i as f64 * opts.spacing - offset, 0.0, 0.0);
        let node = Node::with_capacity(id.as_str(), NodeKind::Router, pos, opts.queue_capacity)
            .named(format!("Router {id}"));
        // 重复 id 直接跳过
        if net.add_node(node).is_ok() {
            ids.push(NodeId::from(id.as_str()));
        }
    }

    for pair in ids.windows(2) {
        let link = Link::new(format!("{}{}", pair[0], pair[1]), pair[0].clone(), pair[1].clone())
            .with_latency(opts.latency_ms)
            .with_bandwidth(opts.bandwidth_mbps);
        // 端点刚刚插入，不会失败
        let _ = net.add_link(link);
    }

    (net, ids)
}

/// 内置默认拓扑：3 个节点、2 条链路
pub fn default_topology(queue_capacity: usize) -> Network {
    let opts = LineOpts {
        queue_capacity,
        ..LineOpts::default()
    };
    build_line("default", &opts).0
}
