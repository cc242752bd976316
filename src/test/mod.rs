use crate::net::{Link, Network, Node, NodeId, NodeKind, Position};
use crate::sim::EngineConfig;

mod engine;

pub(crate) fn nid(s: &str) -> NodeId {
    NodeId::from(s)
}

pub(crate) fn router(id: &str, x: f64) -> Node {
    Node::new(id, NodeKind::Router, Position::new(x, 0.0, 0.0))
}

/// 线形拓扑 A - B - C，时延 10/10
pub(crate) fn line_abc() -> Network {
    let mut net = Network::new("line");
    net.add_node(router("A", -3.0)).unwrap();
    net.add_node(router("B", 0.0)).unwrap();
    net.add_node(router("C", 3.0)).unwrap();
    net.add_link(Link::new("AB", "A", "B").with_latency(10.0)).unwrap();
    net.add_link(Link::new("BC", "B", "C").with_latency(10.0)).unwrap();
    net
}

/// 菱形拓扑：A - B - C 时延 10/10，备用路径 A - D - C 时延 30/30
pub(crate) fn diamond() -> Network {
    let mut net = line_abc();
    net.add_node(router("D", 0.0)).unwrap();
    net.add_link(Link::new("AD", "A", "D").with_latency(30.0)).unwrap();
    net.add_link(Link::new("DC", "D", "C").with_latency(30.0)).unwrap();
    net
}

/// 确定性的测试配置：不自动发包，队列每 tick 必定出队
pub(crate) fn quiet_config() -> EngineConfig {
    EngineConfig {
        auto_generate: false,
        drain_probability: 1.0,
        seed: 7,
        ..EngineConfig::default()
    }
}
