//! Zone selection.
//!
//! Ranks zones by how many of their nodes could host a bundle, and
//! allocates new zones when replica demand exceeds supply. Zone ids grow
//! monotonically within a run.

use tracing::info;

use sizer_core::ids::IdAllocator;
use sizer_core::policy::ControlPlanePolicy;
use sizer_core::types::{MachineSet, Node, Service, ServiceId, Workload, Zone, ZoneId};

use crate::node::can_node_add_service;

/// How many zones are still missing for a service demanding `service.zones`
/// distinct replicas.
pub fn required_zones(service: &Service, zones: &[Zone]) -> u32 {
    service.zones.saturating_sub(zones.len() as u32)
}

/// Grow `zones` to at least `target` entries.
pub fn ensure_zone_count(zones: &mut Vec<Zone>, target: usize, ids: &mut IdAllocator) {
    while zones.len() < target {
        let zone = Zone { id: ids.next_zone_id(), nodes: Vec::new() };
        info!(zone = zone.id, "allocated zone");
        zones.push(zone);
    }
}

/// Zones ranked by the number of nodes that could take the whole bundle,
/// best first. Ties break toward the higher (younger) zone id. Zones with
/// no capable node are dropped; placing there would mean allocating a node.
pub fn sort_best_zones(
    zones: &[Zone],
    nodes: &[Node],
    services: &[Service],
    bundle: &[ServiceId],
    workloads: &[Workload],
    machine_sets: &[MachineSet],
    policy: &ControlPlanePolicy,
) -> Vec<ZoneId> {
    let mut ranked: Vec<(ZoneId, usize)> = zones
        .iter()
        .map(|zone| {
            let capable = zone
                .nodes
                .iter()
                .filter_map(|&node_id| nodes.iter().find(|n| n.id == node_id))
                .filter(|node| {
                    bundle.iter().all(|&sid| {
                        can_node_add_service(node, sid, services, workloads, machine_sets, policy)
                    })
                })
                .count();
            (zone.id, capable)
        })
        .filter(|&(_, capable)| capable > 0)
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    ranked.into_iter().map(|(id, _)| id).collect()
}
