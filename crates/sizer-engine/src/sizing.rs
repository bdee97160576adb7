//! Sizing facade.
//!
//! The entry point callers use: expands workload descriptors into internal
//! form, validates schedulability up front, drives the scheduler workload by
//! workload, and assembles the summary with over-commit metrics.

use serde::Serialize;
use tracing::info;

use sizer_core::catalog::default_instance_for_platform;
use sizer_core::error::{SizingError, SizingResult};
use sizer_core::ids::IdAllocator;
use sizer_core::policy::ControlPlanePolicy;
use sizer_core::types::{
    MachineSet, Node, Platform, Service, ServiceDescriptor, ServiceId, Workload,
    WorkloadDescriptor, Zone,
};

use crate::feasibility::analyze;
use crate::metrics::{cluster_over_commit, node_over_commit, ClusterOverCommit, NodeOverCommit};
use crate::scheduler::schedule_workload;

/// The complete result of a sizing run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSizing {
    pub node_count: usize,
    pub zones: usize,
    #[serde(rename = "totalCPU")]
    pub total_cpu: u64,
    pub total_memory: u64,
    pub nodes: Vec<NodeDetail>,
    pub zone_details: Vec<Zone>,
    pub services: Vec<Service>,
    pub over_commit: ClusterOverCommit,
}

/// A node plus its over-commit metrics, flattened into one JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub node: Node,
    #[serde(flatten)]
    pub over_commit: NodeOverCommit,
}

/// Compute a sizing plan for `descriptors` on `platform`.
///
/// With no caller-provided machine sets, the platform's default instance is
/// wrapped in a single `default` machine set. Fails fast: every workload is
/// feasibility-checked before anything is placed, and any error aborts the
/// run without partial results.
pub fn size(
    descriptors: &[WorkloadDescriptor],
    platform: Platform,
    machine_sets: Option<Vec<MachineSet>>,
    policy: &ControlPlanePolicy,
) -> SizingResult<ClusterSizing> {
    let machine_sets = resolve_machine_sets(platform, machine_sets)?;
    let mut ids = IdAllocator::new();
    let (workloads, services) = expand(descriptors, &mut ids)?;

    info!(
        platform = %platform,
        workloads = workloads.len(),
        services = services.len(),
        machine_sets = machine_sets.len(),
        "sizing run started"
    );

    for workload in &workloads {
        analyze(workload, &services, &machine_sets)?;
    }

    let mut zones: Vec<Zone> = Vec::new();
    let mut nodes: Vec<Node> = Vec::new();
    for workload in &workloads {
        schedule_workload(
            workload,
            &workloads,
            &services,
            &mut zones,
            &mut nodes,
            &machine_sets,
            policy,
            &mut ids,
        )?;
    }

    let node_details: Vec<NodeDetail> = nodes
        .iter()
        .map(|node| NodeDetail {
            over_commit: node_over_commit(node, &services),
            node: node.clone(),
        })
        .collect();
    let over_commit = cluster_over_commit(&nodes, &services);

    info!(nodes = nodes.len(), zones = zones.len(), "sizing run complete");

    Ok(ClusterSizing {
        node_count: nodes.len(),
        zones: zones.len(),
        total_cpu: nodes.iter().map(|n| u64::from(n.cpu_units)).sum(),
        total_memory: nodes.iter().map(|n| u64::from(n.memory)).sum(),
        nodes: node_details,
        zone_details: zones,
        services,
        over_commit,
    })
}

fn resolve_machine_sets(
    platform: Platform,
    machine_sets: Option<Vec<MachineSet>>,
) -> SizingResult<Vec<MachineSet>> {
    match machine_sets {
        Some(sets) if !sets.is_empty() => {
            for ms in &sets {
                if ms.cpu == 0 || ms.memory == 0 {
                    return Err(SizingError::InvalidInput(format!(
                        "machine set {} must have positive cpu and memory",
                        ms.name
                    )));
                }
            }
            Ok(sets)
        }
        _ => {
            let instance = default_instance_for_platform(platform)?;
            Ok(vec![MachineSet {
                name: "default".to_string(),
                cpu: instance.cpu_units,
                memory: instance.memory,
                instance_name: instance.name,
                number_of_disks: instance.max_disks.unwrap_or(24),
                only_for: Vec::new(),
                label: String::new(),
                allow_workload_scheduling: None,
                control_plane_reserved: None,
            }])
        }
    }
}

/// Expand descriptors into workloads and services with run-stable ids.
///
/// Replicated workloads (`count > 1`) rewrite every contained service's
/// `zones` to `count`, fanning each replica out to a distinct zone.
/// `runsWith`/`avoid` names resolve to ids within the same descriptor, and
/// `runsWith` is closed symmetrically.
fn expand(
    descriptors: &[WorkloadDescriptor],
    ids: &mut IdAllocator,
) -> SizingResult<(Vec<Workload>, Vec<Service>)> {
    if descriptors.is_empty() {
        return Err(SizingError::InvalidInput("no workloads given".to_string()));
    }

    let mut workloads = Vec::new();
    let mut services: Vec<Service> = Vec::new();

    for desc in descriptors {
        if desc.count == 0 {
            return Err(SizingError::InvalidInput(format!(
                "workload {} has count 0",
                desc.name
            )));
        }

        let workload_id = ids.next_workload_id();
        let base = services.len();
        let mut service_ids = Vec::new();
        let mut names: Vec<(&str, ServiceId)> = Vec::new();

        for sd in &desc.services {
            validate_service(&desc.name, sd)?;
            let service_id = ids.next_service_id();
            if !names.iter().any(|(n, _)| *n == sd.name.as_str()) {
                names.push((sd.name.as_str(), service_id));
            }
            service_ids.push(service_id);
            services.push(Service {
                id: service_id,
                name: sd.name.clone(),
                required_cpu: sd.required_cpu,
                required_memory: sd.required_memory,
                limit_cpu: sd.limit_cpu,
                limit_memory: sd.limit_memory,
                min_limit_cpu: sd.min_limit_cpu,
                max_limit_cpu: sd.max_limit_cpu,
                min_limit_memory: sd.min_limit_memory,
                max_limit_memory: sd.max_limit_memory,
                over_commit_mode: sd.over_commit_mode,
                zones: if desc.count > 1 { desc.count } else { sd.zones },
                runs_with: Vec::new(),
                avoid: Vec::new(),
                owner: Some(workload_id),
            });
        }

        // Resolve name references now that every sibling has an id.
        for (i, sd) in desc.services.iter().enumerate() {
            let service_id = service_ids[i];
            let mut runs_with = resolve_refs(&desc.name, &sd.name, "runsWith", &sd.runs_with, &names)?;
            runs_with.retain(|&id| id != service_id);
            let avoid = resolve_refs(&desc.name, &sd.name, "avoid", &sd.avoid, &names)?;
            if avoid.contains(&service_id) {
                return Err(SizingError::InvalidInput(format!(
                    "service {} in workload {} cannot avoid itself",
                    sd.name, desc.name
                )));
            }
            services[base + i].runs_with = runs_with;
            services[base + i].avoid = avoid;
        }

        // Symmetric closure of runsWith within this workload.
        for i in 0..desc.services.len() {
            let service_id = service_ids[i];
            for partner in services[base + i].runs_with.clone() {
                let partner_idx = partner as usize;
                if !services[partner_idx].runs_with.contains(&service_id) {
                    services[partner_idx].runs_with.push(service_id);
                }
            }
        }
        for idx in base..services.len() {
            services[idx].runs_with.sort_unstable();
            services[idx].runs_with.dedup();
            let svc = &services[idx];
            if svc.runs_with.iter().any(|id| svc.avoid.contains(id)) {
                return Err(SizingError::InvalidInput(format!(
                    "service {} in workload {} both runs with and avoids the same service",
                    svc.name, desc.name
                )));
            }
        }

        workloads.push(Workload {
            id: workload_id,
            name: desc.name.clone(),
            count: desc.count,
            uses_machines: desc.uses_machines.clone(),
            services: service_ids,
            allow_control_plane: desc.allow_control_plane,
            require_control_plane: desc.require_control_plane,
        });
    }

    Ok((workloads, services))
}

fn validate_service(workload: &str, sd: &ServiceDescriptor) -> SizingResult<()> {
    let fail = |msg: String| Err(SizingError::InvalidInput(msg));

    if sd.required_cpu < 0.0 || sd.required_memory < 0.0 {
        return fail(format!(
            "service {} in workload {workload} has negative resource requests",
            sd.name
        ));
    }
    if sd.zones == 0 {
        return fail(format!(
            "service {} in workload {workload} must target at least one zone",
            sd.name
        ));
    }
    if sd.limit_cpu.is_some_and(|limit| limit < sd.required_cpu) {
        return fail(format!(
            "service {} in workload {workload} has limitCPU below requiredCPU",
            sd.name
        ));
    }
    if sd.limit_memory.is_some_and(|limit| limit < sd.required_memory) {
        return fail(format!(
            "service {} in workload {workload} has limitMemory below requiredMemory",
            sd.name
        ));
    }
    Ok(())
}

fn resolve_refs(
    workload: &str,
    service: &str,
    field: &str,
    refs: &[String],
    names: &[(&str, ServiceId)],
) -> SizingResult<Vec<ServiceId>> {
    let mut resolved = Vec::new();
    for reference in refs {
        let id = names
            .iter()
            .find(|(name, _)| name == reference)
            .map(|&(_, id)| id)
            .ok_or_else(|| {
                SizingError::InvalidInput(format!(
                    "service {service} in workload {workload}: {field} references unknown service {reference}"
                ))
            })?;
        resolved.push(id);
    }
    resolved.sort_unstable();
    resolved.dedup();
    Ok(resolved)
}
