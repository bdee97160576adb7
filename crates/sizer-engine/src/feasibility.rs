//! Workload feasibility analysis.
//!
//! Before anything is scheduled, every workload is checked against the
//! machine-set catalog: which sets could host its heaviest co-placement
//! bundle on a single node? A workload with no surviving candidate fails
//! the whole sizing run with a `NotSchedulable` error that names the target
//! machine set and the minimum viable node size.

use tracing::warn;

use sizer_core::error::{SizingError, SizingResult};
use sizer_core::policy::is_control_plane_machine_set;
use sizer_core::resources::{kubelet_overhead, total_request, KubeletOverhead, ResourceFootprint};
use sizer_core::types::{MachineSet, Service, Workload};

use crate::bundles::bundles;
use crate::node::machine_set_for_workload;
use crate::service;

/// Largest machine-set size ever suggested, in cores and GB.
const MIN_VIABLE_CPU_CAP: u32 = 200;
const MIN_VIABLE_MEMORY_CAP: u32 = 512;

/// Machine sets that could host every co-placement bundle of `workload`.
///
/// Candidate pre-selection, in order:
/// 1. `usesMachines` names, when the workload pins them.
/// 2. Sets dedicated to this workload via `onlyFor`.
/// 3. Every universal or matching set, excluding control-plane sets that do
///    not allow workload scheduling.
///
/// A candidate survives only if each bundle fits on one node of that set,
/// kubelet overhead included. Bundles are checked heaviest-first so failure
/// surfaces early.
pub fn analyze<'a>(
    workload: &Workload,
    services: &[Service],
    machine_sets: &'a [MachineSet],
) -> SizingResult<Vec<&'a MachineSet>> {
    let candidates = candidate_machine_sets(workload, machine_sets);

    let mut footprints: Vec<ResourceFootprint> = bundles(workload, services)
        .iter()
        .map(|bundle| total_request(bundle.iter().filter_map(|&id| service(services, id))))
        .collect();
    footprints.sort_by(|a, b| b.weight().total_cmp(&a.weight()));

    let retained: Vec<&MachineSet> = candidates
        .iter()
        .filter(|ms| footprints.iter().all(|fp| fits_machine_set(fp, ms)))
        .copied()
        .collect();

    if retained.is_empty() {
        return Err(not_schedulable(workload, &candidates, machine_sets, footprints.first()));
    }
    Ok(retained)
}

fn candidate_machine_sets<'a>(
    workload: &Workload,
    machine_sets: &'a [MachineSet],
) -> Vec<&'a MachineSet> {
    if !workload.uses_machines.is_empty() {
        return machine_sets
            .iter()
            .filter(|ms| workload.uses_machines.contains(&ms.name))
            .collect();
    }

    let dedicated: Vec<&MachineSet> = machine_sets
        .iter()
        .filter(|ms| ms.only_for.contains(&workload.name))
        .collect();
    if !dedicated.is_empty() {
        return dedicated;
    }

    machine_sets
        .iter()
        .filter(|ms| ms.only_for.is_empty() || ms.only_for.contains(&workload.name))
        .filter(|ms| {
            !is_control_plane_machine_set(&ms.name)
                || ms.allow_workload_scheduling == Some(true)
        })
        .collect()
}

fn fits_machine_set(footprint: &ResourceFootprint, machine_set: &MachineSet) -> bool {
    let kubelet = kubelet_overhead(machine_set.cpu, machine_set.memory);
    footprint.cpu + kubelet.cpu <= f64::from(machine_set.cpu)
        && footprint.memory + kubelet.memory <= f64::from(machine_set.memory)
        && footprint.disks <= machine_set.number_of_disks
}

fn not_schedulable(
    workload: &Workload,
    candidates: &[&MachineSet],
    machine_sets: &[MachineSet],
    heaviest: Option<&ResourceFootprint>,
) -> SizingError {
    // Name the set the failed check actually ran against: the first
    // pre-selected candidate. Only an empty pre-selection falls back to the
    // node engine's machine-set precedence.
    let target = candidates
        .first()
        .copied()
        .or_else(|| machine_set_for_workload(workload, machine_sets));
    let target_name = target
        .map(|ms| ms.name.clone())
        .or_else(|| workload.uses_machines.first().cloned())
        .unwrap_or_else(|| "default".to_string());

    let footprint = heaviest.copied().unwrap_or_default();
    let kubelet = target
        .map(|ms| kubelet_overhead(ms.cpu, ms.memory))
        .unwrap_or(KubeletOverhead { cpu: 0.0, memory: 0.0 });

    let mut failing = Vec::new();
    if let Some(ms) = target {
        if footprint.cpu + kubelet.cpu > f64::from(ms.cpu) {
            failing.push("CPU");
        }
        if footprint.memory + kubelet.memory > f64::from(ms.memory) {
            failing.push("memory");
        }
        if footprint.disks > ms.number_of_disks {
            failing.push("disks");
        }
    }
    let constraint = if failing.is_empty() {
        "capacity".to_string()
    } else {
        failing.join(" and ")
    };

    let min_cpu = (((footprint.cpu + kubelet.cpu) / 2.0).ceil() as u32 * 2).min(MIN_VIABLE_CPU_CAP);
    let min_memory =
        (((footprint.memory + kubelet.memory) / 4.0).ceil() as u32 * 4).min(MIN_VIABLE_MEMORY_CAP);

    warn!(
        workload = %workload.name,
        machine_set = %target_name,
        constraint = %constraint,
        min_cpu,
        min_memory,
        "workload is not schedulable"
    );

    SizingError::NotSchedulable {
        workload: workload.name.clone(),
        machine_set: target_name,
        constraint,
        min_cpu,
        min_memory,
    }
}
