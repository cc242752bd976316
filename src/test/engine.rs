use super::{diamond, line_abc, nid, quiet_config};
use crate::net::{CongestionLevel, DropReason, Link, Network, QueueSlot, Stats};
use crate::routing::{AdaptiveRouting, RoutingAlgorithm, RoutingKind};
use crate::sim::{Engine, EngineConfig, SimTime, Statistics};

const DT: f64 = 0.1;

/// 反复 tick 直到条件成立；超过 `max_ticks` 视为失败
fn run_until(engine: &mut Engine, max_ticks: usize, mut done: impl FnMut(&Engine) -> bool) {
    for _ in 0..max_ticks {
        if done(engine) {
            return;
        }
        engine.update(DT);
    }
    assert!(done(engine), "condition not reached within {max_ticks} ticks");
}

fn started(net: Network, config: EngineConfig) -> Engine {
    let mut engine = Engine::new(net, config);
    engine.start();
    engine
}

#[test]
fn line_packet_is_delivered_over_two_hops() {
    let mut engine = started(line_abc(), quiet_config());
    let id = engine.generate_packet(&nid("A"), &nid("C")).expect("route exists");

    run_until(&mut engine, 500, |e| e.delivered().len() == 1);

    let pkt = engine.packet(id).unwrap();
    assert!(pkt.is_delivered());
    assert_eq!(pkt.path, vec![nid("A"), nid("B"), nid("C")]);
    assert_eq!(pkt.hops_taken, 2);
    assert!(engine.in_flight().is_empty());

    let net = engine.network();
    assert_eq!(net.node(&nid("A")).unwrap().counters.sent, 1);
    assert_eq!(net.node(&nid("B")).unwrap().counters.forwarded, 1);
    assert_eq!(net.node(&nid("C")).unwrap().counters.received, 1);
    assert_eq!(net.link(&"AB".into()).unwrap().packets_transmitted, 1);
    assert_eq!(net.link(&"BC".into()).unwrap().bytes_transmitted, 1500);
    assert_eq!(net.stats.delivered_pkts, 1);

    let stats = engine.get_statistics();
    assert_eq!(stats.total_generated, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.delivery_rate, 1.0);
    // 每跳约 2 秒仿真时间
    assert!(stats.average_latency_ms >= 3900.0, "{}", stats.average_latency_ms);
}

#[test]
fn arrival_at_full_queue_drops_packet() {
    let config = EngineConfig {
        drain_probability: 0.0,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    assert_eq!(engine.network_mut().node_mut(&nid("B")).unwrap().fill_queue(), 20);

    let id = engine.generate_packet(&nid("A"), &nid("C")).expect("B is still the only path");
    run_until(&mut engine, 500, |e| e.dropped().len() == 1);

    let pkt = engine.packet(id).unwrap();
    assert!(pkt.is_dropped());
    assert_eq!(pkt.drop_reason(), Some(&DropReason::QueueFull { node: nid("B") }));
    assert_eq!(pkt.current, nid("B"));

    let b = engine.network().node(&nid("B")).unwrap();
    assert_eq!(b.counters.dropped, 1);
    assert_eq!(b.queue.total_dropped(), 1);
    assert_eq!(b.queue.len(), 20);

    let stats = engine.get_statistics();
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.delivery_rate, 0.0);
    assert_eq!(stats.average_latency_ms, 0.0);
}

#[test]
fn dropped_packet_lingers_for_grace_period() {
    let config = EngineConfig {
        drain_probability: 0.0,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    engine.network_mut().node_mut(&nid("B")).unwrap().fill_queue();
    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();

    run_until(&mut engine, 500, |e| e.packet(id).is_some_and(|p| p.is_dropped()));
    let dropped_at = engine.packet(id).unwrap().finished_at.unwrap();
    assert_eq!(engine.in_flight().len(), 1);

    run_until(&mut engine, 50, |e| e.dropped().len() == 1);
    assert!(engine.now().saturating_sub(dropped_at) >= engine.config().drop_grace());
    assert!(engine.in_flight().is_empty());
}

#[test]
fn forcing_congestion_reroutes_around_node() {
    let mut engine = started(diamond(), quiet_config());
    assert_eq!(
        engine.routing().route(engine.network(), &nid("A"), &nid("C")),
        Some(vec![nid("A"), nid("B"), nid("C")])
    );

    assert_eq!(engine.toggle_force_congestion(&nid("B")), Some(true));
    let b = engine.network().node(&nid("B")).unwrap();
    assert!(b.is_force_congested());
    assert!(b.queue.is_full());
    assert_eq!(b.congestion(), CongestionLevel::High);
    assert_eq!(
        engine.network().node(&nid("A")).unwrap().next_hop(&nid("C")),
        Some(&nid("D"))
    );
    assert_eq!(
        engine.routing().route(engine.network(), &nid("A"), &nid("C")),
        Some(vec![nid("A"), nid("D"), nid("C")])
    );

    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    run_until(&mut engine, 1000, |e| e.delivered().len() == 1);
    assert_eq!(engine.packet(id).unwrap().path, vec![nid("A"), nid("D"), nid("C")]);

    // 出队概率为 1，强制拥塞节点仍保持满队列
    assert!(engine.network().node(&nid("B")).unwrap().queue.is_full());
}

#[test]
fn releasing_forced_congestion_flushes_queue_and_restores_route() {
    let mut engine = started(diamond(), quiet_config());
    engine.toggle_force_congestion(&nid("B"));
    assert_eq!(engine.toggle_force_congestion(&nid("B")), Some(false));

    let b = engine.network().node(&nid("B")).unwrap();
    assert!(!b.is_force_congested());
    assert!(b.queue.is_empty());
    assert_eq!(b.congestion(), CongestionLevel::Low);
    assert_eq!(
        engine.network().node(&nid("A")).unwrap().next_hop(&nid("C")),
        Some(&nid("B"))
    );
    assert_eq!(engine.toggle_force_congestion(&nid("nope")), None);
}

#[test]
fn flushing_queue_drops_waiting_packets() {
    let config = EngineConfig {
        drain_probability: 0.0,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    run_until(&mut engine, 500, |e| {
        e.network().node(&nid("B")).unwrap().queued_packets() == 1
    });
    assert!(engine.packet(id).unwrap().next_hop.is_none());

    engine.toggle_force_congestion(&nid("B"));
    engine.toggle_force_congestion(&nid("B"));

    let pkt = engine.packet(id).unwrap();
    assert_eq!(pkt.drop_reason(), Some(&DropReason::QueueFlushed { node: nid("B") }));
    assert_eq!(engine.network().node(&nid("B")).unwrap().counters.dropped, 1);
    run_until(&mut engine, 50, |e| e.dropped().len() == 1);
}

#[test]
fn congest_node_fills_once_and_then_drains() {
    let mut engine = started(line_abc(), quiet_config());
    assert_eq!(engine.congest_node(&nid("B")), Some(20));
    assert!(!engine.network().node(&nid("B")).unwrap().is_force_congested());

    for _ in 0..5 {
        engine.update(DT);
    }
    assert_eq!(engine.network().node(&nid("B")).unwrap().queue.len(), 15);
    assert_eq!(engine.congest_node(&nid("B")), Some(5));
    assert_eq!(engine.congest_node(&nid("nope")), None);
}

#[test]
fn queued_packet_without_route_is_dropped() {
    let mut engine = started(line_abc(), quiet_config());
    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    engine.network_mut().remove_link(&"BC".into()).unwrap();

    run_until(&mut engine, 500, |e| e.dropped().len() == 1);
    assert_eq!(
        engine.packet(id).unwrap().drop_reason(),
        Some(&DropReason::NoRouteFromQueue { node: nid("B") })
    );
}

#[test]
fn zero_speed_freezes_simulation() {
    let config = EngineConfig {
        auto_generate: true,
        ..EngineConfig::default()
    };
    let mut engine = started(line_abc(), config);
    engine.set_speed(0.0);
    for _ in 0..200 {
        engine.update(DT);
    }
    assert_eq!(engine.now(), SimTime::ZERO);
    assert_eq!(engine.get_statistics().total_generated, 0);
    assert!(engine.in_flight().is_empty());
}

#[test]
fn speed_is_clamped_to_configured_range() {
    let mut engine = Engine::new(line_abc(), quiet_config());
    assert_eq!(engine.speed(), 1.0);
    engine.set_speed(100.0);
    assert_eq!(engine.speed(), 10.0);
    engine.set_speed(-3.0);
    assert_eq!(engine.speed(), 0.0);
    engine.set_speed(2.5);
    assert_eq!(engine.speed(), 2.5);
}

#[test]
fn paused_engine_does_not_advance() {
    let mut engine = Engine::new(line_abc(), quiet_config());
    assert!(!engine.is_running());
    engine.update(DT);
    assert_eq!(engine.now(), SimTime::ZERO);

    engine.start();
    engine.update(DT);
    assert_eq!(engine.now(), SimTime::from_millis(100));
    engine.pause();
    engine.update(DT);
    assert_eq!(engine.now(), SimTime::from_millis(100));
}

#[test]
fn generate_packet_rejects_invalid_endpoints() {
    let mut engine = started(line_abc(), quiet_config());
    assert!(engine.generate_packet(&nid("A"), &nid("A")).is_none());
    assert!(engine.generate_packet(&nid("A"), &nid("Z")).is_none());
    assert!(engine.generate_packet(&nid("Z"), &nid("A")).is_none());
    assert!(engine.dropped().is_empty());
    assert_eq!(engine.get_statistics().total_generated, 0);
}

#[test]
fn unroutable_packet_goes_straight_to_dropped() {
    let mut net = line_abc();
    net.add_node(super::router("E", 9.0)).unwrap();
    let mut engine = started(net, quiet_config());

    assert!(engine.generate_packet(&nid("A"), &nid("E")).is_none());
    assert_eq!(engine.dropped().len(), 1);
    assert_eq!(engine.dropped()[0].drop_reason(), Some(&DropReason::NoRoute));
    assert!(engine.in_flight().is_empty());
    assert_eq!(engine.get_statistics().total_generated, 0);
}

#[test]
fn random_generation_respects_in_flight_cap() {
    let config = EngineConfig {
        max_in_flight: 2,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    assert!(engine.generate_random_packet().is_some());
    assert!(engine.generate_random_packet().is_some());
    assert!(engine.generate_random_packet().is_none());
    for p in engine.in_flight() {
        assert_ne!(p.src, p.dst);
    }

    let mut lonely = Network::new("lonely");
    lonely.add_node(super::router("A", 0.0)).unwrap();
    let mut engine = started(lonely, quiet_config());
    assert!(engine.generate_random_packet().is_none());
}

#[test]
fn auto_generation_follows_interval() {
    let config = EngineConfig {
        auto_generate: true,
        ..quiet_config()
    };
    let mut engine = started(diamond(), config);
    // 0.5 秒间隔，2 秒内生成 4 个
    for _ in 0..20 {
        engine.update(DT);
    }
    assert_eq!(engine.get_statistics().total_generated, 4);
}

#[test]
fn same_seed_reproduces_same_run() {
    let run = || {
        let config = EngineConfig {
            seed: 42,
            ..EngineConfig::default()
        };
        let mut engine = started(diamond(), config);
        for _ in 0..600 {
            engine.update(0.05);
        }
        (engine.get_statistics(), engine.viz_frame().packets.len())
    };
    let (a, pa) = run();
    let (b, pb) = run();
    assert_eq!(a, b);
    assert_eq!(pa, pb);
    assert!(a.total_generated > 0);
}

#[test]
fn reset_restores_initial_state_and_replays_identically() {
    let config = EngineConfig {
        seed: 9,
        ..EngineConfig::default()
    };
    let mut engine = started(diamond(), config);
    engine.toggle_force_congestion(&nid("D"));
    for _ in 0..300 {
        engine.update(0.05);
    }
    let first = engine.get_statistics();
    assert!(first.total_generated > 0);

    engine.reset();
    assert!(!engine.is_running());
    assert_eq!(engine.now(), SimTime::ZERO);
    assert_eq!(engine.get_statistics(), Statistics::default());
    assert_eq!(engine.network().stats, Stats::default());
    assert!(engine.network().node(&nid("D")).unwrap().is_force_congested());
    assert_eq!(engine.network().node(&nid("A")).unwrap().counters.sent, 0);
    assert_eq!(engine.network().link(&"AB".into()).unwrap().packets_transmitted, 0);

    engine.start();
    for _ in 0..300 {
        engine.update(0.05);
    }
    assert_eq!(engine.get_statistics(), first);
}

#[test]
fn queue_slot_order_is_preserved_per_node() {
    let config = EngineConfig {
        drain_probability: 0.0,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    let first = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    let second = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    run_until(&mut engine, 500, |e| {
        e.network().node(&nid("B")).unwrap().queued_packets() == 2
    });
    let queued: Vec<QueueSlot> = engine
        .network()
        .node(&nid("B"))
        .unwrap()
        .queue
        .iter()
        .copied()
        .collect();
    assert_eq!(queued, vec![QueueSlot::Packet(first), QueueSlot::Packet(second)]);
}

#[test]
fn packet_on_removed_link_is_dropped() {
    let mut engine = started(line_abc(), quiet_config());
    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    engine.update(DT);
    engine.network_mut().remove_link(&"AB".into()).unwrap();

    run_until(&mut engine, 50, |e| e.dropped().len() == 1);
    assert_eq!(
        engine.packet(id).unwrap().drop_reason(),
        Some(&DropReason::LinkMissing {
            from: nid("A"),
            to: nid("B")
        })
    );
    assert_eq!(engine.get_statistics().active, 0);
    assert_eq!(engine.network().node(&nid("A")).unwrap().counters.dropped, 1);
}

#[test]
fn packet_queued_at_removed_node_is_dropped() {
    let config = EngineConfig {
        drain_probability: 0.0,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    run_until(&mut engine, 500, |e| {
        e.network().node(&nid("B")).unwrap().queued_packets() == 1
    });
    engine.network_mut().remove_node(&nid("B")).unwrap();

    run_until(&mut engine, 50, |e| e.dropped().len() == 1);
    assert_eq!(
        engine.packet(id).unwrap().drop_reason(),
        Some(&DropReason::NodeMissing { node: nid("B") })
    );
    assert!(engine.in_flight().is_empty());
}

#[test]
fn packet_missing_from_cleared_queue_is_dropped() {
    let config = EngineConfig {
        drain_probability: 0.0,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    run_until(&mut engine, 500, |e| {
        e.network().node(&nid("B")).unwrap().queued_packets() == 1
    });
    engine
        .network_mut()
        .node_mut(&nid("B"))
        .unwrap()
        .queue
        .clear();

    run_until(&mut engine, 50, |e| e.dropped().len() == 1);
    assert_eq!(
        engine.packet(id).unwrap().drop_reason(),
        Some(&DropReason::QueueFlushed { node: nid("B") })
    );
}

#[test]
fn stranded_packets_free_generation_slots() {
    let config = EngineConfig {
        max_in_flight: 1,
        ..quiet_config()
    };
    let mut engine = started(line_abc(), config);
    engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    engine.update(DT);
    engine.network_mut().remove_link(&"AB".into()).unwrap();
    engine.network_mut().add_link(Link::new("AC", "A", "C")).unwrap();

    engine.set_auto_generate(true);
    assert!(engine.auto_generate());
    run_until(&mut engine, 100, |e| e.get_statistics().total_generated > 1);
    assert_eq!(engine.dropped().len(), 1);
}

#[test]
fn flooding_delivers_through_congested_node() {
    let config = EngineConfig {
        routing: RoutingKind::Flooding,
        ..quiet_config()
    };
    let mut engine = started(diamond(), config);
    assert_eq!(engine.routing_kind(), RoutingKind::Flooding);
    assert_eq!(engine.congest_node(&nid("B")), Some(20));

    // 自适应策略此时会绕开 B
    assert_eq!(
        AdaptiveRouting::default().route(engine.network(), &nid("A"), &nid("C")),
        Some(vec![nid("A"), nid("D"), nid("C")])
    );

    let id = engine.generate_packet(&nid("A"), &nid("C")).unwrap();
    run_until(&mut engine, 500, |e| e.delivered().len() == 1);

    let pkt = engine.packet(id).unwrap();
    assert_eq!(pkt.path, vec![nid("A"), nid("B"), nid("C")]);
    assert_eq!(pkt.hops_taken, 2);
    assert_eq!(engine.network().node(&nid("B")).unwrap().counters.forwarded, 1);
}
