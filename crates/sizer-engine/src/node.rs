//! Node engine.
//!
//! Answers whether a node can admit a service under every placement
//! constraint, allocates nodes from machine sets, and places co-placement
//! bundles into a zone — on the emptiest feasible node, or a new one.

use tracing::{debug, info};

use sizer_core::error::{SizingError, SizingResult};
use sizer_core::ids::IdAllocator;
use sizer_core::policy::{is_control_plane_machine_set, ControlPlanePolicy};
use sizer_core::resources::{can_support, total_request};
use sizer_core::types::{
    MachineSet, Node, ReservedCapacity, Service, ServiceId, Workload, Zone, ZoneId,
};

use crate::{owner_of, service};

/// Whether `node` can admit `candidate` together with its co-runners.
///
/// Checks, in order: ownership, machine-set pinning, control-plane routing,
/// dedicated-node taints, anti-affinity (both directions), and capacity.
pub fn can_node_add_service(
    node: &Node,
    candidate: ServiceId,
    services: &[Service],
    workloads: &[Workload],
    machine_sets: &[MachineSet],
    policy: &ControlPlanePolicy,
) -> bool {
    let Some(svc) = service(services, candidate) else {
        return false;
    };
    let Some(owner) = owner_of(svc, workloads) else {
        return false;
    };

    // Machine-set pinning.
    if !owner.uses_machines.is_empty() && !owner.uses_machines.contains(&node.machine_set) {
        return false;
    }

    // Control-plane routing.
    let machine_set = machine_sets.iter().find(|ms| ms.name == node.machine_set);
    if node.is_control_plane {
        if !policy.is_control_plane_service(&svc.name) {
            let set_allows = machine_set
                .and_then(|ms| ms.allow_workload_scheduling)
                .unwrap_or(false);
            if !node.allow_workload_scheduling && !set_allows {
                return false;
            }
        }
    } else if owner.require_control_plane {
        return false;
    }

    // Dedicated-node taint. A schedulable control plane admits anything.
    if !node.only_for.is_empty() && !node.only_for.contains(&owner.name) {
        let schedulable_control_plane =
            node.machine_set == "controlPlane" && node.allow_workload_scheduling;
        if !schedulable_control_plane {
            return false;
        }
    }

    // Anti-affinity, in both directions.
    for &placed in &node.services {
        if svc.avoid.contains(&placed) {
            return false;
        }
        if service(services, placed).is_some_and(|other| other.avoid.contains(&candidate)) {
            return false;
        }
    }

    // Capacity: the candidate lands together with all of its co-runners.
    let mut group: Vec<&Service> = vec![svc];
    for &rid in &svc.runs_with {
        if let Some(runner) = service(services, rid) {
            group.push(runner);
        }
    }
    let requirement = total_request(group);
    let usage = total_request(node.services.iter().filter_map(|&id| service(services, id)));
    can_support(&requirement, &usage, node)
}

/// The machine set a new node for `workload` is cut from.
///
/// Precedence: a set dedicated to the workload via `onlyFor`, the first of
/// the workload's `usesMachines`, the first non-control-plane set, the first
/// set overall.
pub fn machine_set_for_workload<'a>(
    workload: &Workload,
    machine_sets: &'a [MachineSet],
) -> Option<&'a MachineSet> {
    machine_sets
        .iter()
        .find(|ms| ms.only_for.contains(&workload.name))
        .or_else(|| {
            workload
                .uses_machines
                .first()
                .and_then(|name| machine_sets.iter().find(|ms| &ms.name == name))
        })
        .or_else(|| {
            machine_sets
                .iter()
                .find(|ms| !is_control_plane_machine_set(&ms.name))
        })
        .or_else(|| machine_sets.first())
}

/// Allocate a node of the given machine set.
pub fn node_from_machine_set(machine_set: &MachineSet, ids: &mut IdAllocator) -> Node {
    let is_control_plane = is_control_plane_machine_set(&machine_set.name);
    let control_plane_reserved = machine_set.control_plane_reserved.unwrap_or(if is_control_plane {
        ReservedCapacity::CONTROL_PLANE_DEFAULT
    } else {
        ReservedCapacity::ZERO
    });

    Node {
        id: ids.next_node_id(),
        machine_set: machine_set.name.clone(),
        cpu_units: machine_set.cpu,
        memory: machine_set.memory,
        max_disks: machine_set.number_of_disks,
        instance_name: machine_set.instance_name.clone(),
        only_for: machine_set.only_for.clone(),
        services: Vec::new(),
        is_control_plane,
        allow_workload_scheduling: machine_set.allow_workload_scheduling.unwrap_or(false),
        control_plane_reserved,
    }
}

/// Place `bundle` in the given zone.
///
/// Among the zone's nodes that can admit every bundle member, the one with
/// the least memory already consumed wins (first wins on ties). With no
/// feasible node, a new one is allocated from the owning workload's machine
/// set and appended to the zone.
pub fn add_service_to_zone(
    zone_id: ZoneId,
    zones: &mut [Zone],
    nodes: &mut Vec<Node>,
    services: &[Service],
    bundle: &[ServiceId],
    workloads: &[Workload],
    machine_sets: &[MachineSet],
    policy: &ControlPlanePolicy,
    ids: &mut IdAllocator,
) -> SizingResult<()> {
    let zone_pos = zones
        .iter()
        .position(|z| z.id == zone_id)
        .ok_or_else(|| SizingError::Internal(format!("zone {zone_id} does not exist")))?;

    let mut best: Option<(usize, f64)> = None;
    for &node_id in &zones[zone_pos].nodes {
        let Some(idx) = nodes.iter().position(|n| n.id == node_id) else {
            continue;
        };
        let node = &nodes[idx];
        let admits_all = bundle
            .iter()
            .all(|&sid| can_node_add_service(node, sid, services, workloads, machine_sets, policy));
        if !admits_all {
            continue;
        }
        let used_memory =
            total_request(node.services.iter().filter_map(|&id| service(services, id))).memory;
        if best.is_none_or(|(_, least)| used_memory < least) {
            best = Some((idx, used_memory));
        }
    }

    if let Some((idx, _)) = best {
        nodes[idx].services.extend_from_slice(bundle);
        debug!(
            node = nodes[idx].id,
            zone = zone_id,
            services = bundle.len(),
            "placed bundle on existing node"
        );
        return Ok(());
    }

    let owner = bundle
        .first()
        .and_then(|&sid| service(services, sid))
        .and_then(|svc| owner_of(svc, workloads))
        .ok_or_else(|| SizingError::Internal("bundle has no owning workload".to_string()))?;
    let machine_set = machine_set_for_workload(owner, machine_sets)
        .ok_or_else(|| SizingError::Internal("no machine sets available".to_string()))?;

    let mut node = node_from_machine_set(machine_set, ids);
    node.services.extend_from_slice(bundle);
    info!(
        node = node.id,
        zone = zone_id,
        machine_set = %machine_set.name,
        "allocated node"
    );
    zones[zone_pos].nodes.push(node.id);
    nodes.push(node);
    Ok(())
}
