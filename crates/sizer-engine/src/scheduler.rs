//! Workload scheduler.
//!
//! Places one workload across zones and nodes. Services are walked in input
//! order; each service pulls its whole co-placement bundle, which is then
//! replicated over as many distinct zones as its most-replicated member
//! demands. Zone choice delegates to the zone selector, node choice to the
//! node engine. Iteration orders follow the input and every tie-break is
//! fixed, so identical inputs always produce identical placements.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use sizer_core::error::{SizingError, SizingResult};
use sizer_core::ids::IdAllocator;
use sizer_core::policy::ControlPlanePolicy;
use sizer_core::types::{MachineSet, Node, Service, ServiceId, Workload, Zone, ZoneId};

use crate::bundles::bundle_containing;
use crate::node::add_service_to_zone;
use crate::service;
use crate::zones::{ensure_zone_count, sort_best_zones};

/// Place every service of `workload`, mutating `zones` and `nodes`.
///
/// Callers thread the same zone/node state through successive workloads.
pub fn schedule_workload(
    workload: &Workload,
    workloads: &[Workload],
    services: &[Service],
    zones: &mut Vec<Zone>,
    nodes: &mut Vec<Node>,
    machine_sets: &[MachineSet],
    policy: &ControlPlanePolicy,
    ids: &mut IdAllocator,
) -> SizingResult<()> {
    let max_zone_demand = workload
        .services
        .iter()
        .filter_map(|&id| service(services, id))
        .map(|svc| svc.zones)
        .max()
        .unwrap_or(1)
        .max(1);
    ensure_zone_count(zones, max_zone_demand as usize, ids);

    let mut placed: BTreeSet<ServiceId> = BTreeSet::new();
    for &seed in &workload.services {
        if placed.contains(&seed) {
            continue;
        }

        let bundle = bundle_containing(seed, workload, services);
        let replicas = bundle
            .iter()
            .filter_map(|&id| service(services, id))
            .map(|svc| svc.zones)
            .max()
            .unwrap_or(1)
            .max(1);

        debug!(
            workload = %workload.name,
            bundle = ?bundle,
            replicas,
            "placing bundle"
        );

        let mut used: Vec<ZoneId> = Vec::new();
        for _ in 0..replicas {
            let target = pick_zone(
                zones, nodes, services, &bundle, &mut used, workload, workloads, machine_sets,
                policy,
            )?;
            used.push(target);
            add_service_to_zone(
                target, zones, nodes, services, &bundle, workloads, machine_sets, policy, ids,
            )?;
        }

        placed.extend(bundle);
    }

    Ok(())
}

/// The zone the next replica lands in: the best-ranked zone not yet used by
/// this bundle, then any unused zone, then (with the used-set reset) the
/// youngest zone. The lenient fallbacks keep placement moving when zone
/// supply is scarce.
#[allow(clippy::too_many_arguments)]
fn pick_zone(
    zones: &[Zone],
    nodes: &[Node],
    services: &[Service],
    bundle: &[ServiceId],
    used: &mut Vec<ZoneId>,
    workload: &Workload,
    workloads: &[Workload],
    machine_sets: &[MachineSet],
    policy: &ControlPlanePolicy,
) -> SizingResult<ZoneId> {
    let ranked = sort_best_zones(zones, nodes, services, bundle, workloads, machine_sets, policy);
    if let Some(zone) = ranked.iter().copied().find(|z| !used.contains(z)) {
        return Ok(zone);
    }

    if let Some(zone) = zones.iter().map(|z| z.id).filter(|z| !used.contains(z)).max() {
        debug!(zone, "no ranked zone left; using empty-handed zone");
        return Ok(zone);
    }

    warn!(
        workload = %workload.name,
        "zone supply exhausted for bundle; reusing zones"
    );
    used.clear();
    zones
        .iter()
        .map(|z| z.id)
        .max()
        .ok_or_else(|| SizingError::Internal("no zones allocated".to_string()))
}
