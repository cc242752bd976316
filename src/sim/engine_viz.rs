//! Snapshot export for external renderers.

use crate::viz::{VizFrame, VizLink, VizNode, VizPacket};

use super::engine::Engine;

impl Engine {
    /// Captures the observable state after the last completed tick.
    pub fn viz_frame(&self) -> VizFrame {
        let nodes = self
            .network
            .nodes()
            .map(|n| VizNode {
                id: n.id.to_string(),
                name: n.name.clone(),
                kind: n.kind,
                position: n.position,
                queue_len: n.queue.len(),
                queue_cap: n.queue.capacity(),
                congestion: n.congestion(),
                force_congested: n.is_force_congested(),
                counters: n.counters,
            })
            .collect();
        let links = self
            .network
            .links()
            .map(|l| VizLink {
                id: l.id.to_string(),
                source: l.source.to_string(),
                target: l.target.to_string(),
                bidirectional: l.bidirectional,
                latency_ms: l.latency_ms,
                bandwidth_mbps: l.bandwidth_mbps,
                packets_transmitted: l.packets_transmitted,
            })
            .collect();
        let packets = self
            .in_flight
            .iter()
            .map(|p| VizPacket {
                id: p.id,
                src: p.src.to_string(),
                dst: p.dst.to_string(),
                current: p.current.to_string(),
                next_hop: p.next_hop.as_ref().map(|n| n.to_string()),
                progress: p.progress,
                position: self.packet_position(p),
                state: p.state(),
                drop_reason: p.drop_reason().map(|r| r.to_string()),
            })
            .collect();

        let stats = self.get_statistics();
        VizFrame {
            t_s: stats.simulation_time_s,
            nodes,
            links,
            packets,
            total_generated: stats.total_generated,
            delivered: stats.delivered,
            dropped: stats.dropped,
            delivery_rate: stats.delivery_rate,
            average_latency_ms: stats.average_latency_ms,
        }
    }
}
