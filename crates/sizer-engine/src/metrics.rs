//! Over-commit metrics.
//!
//! Sums requests and limits per node and cluster-wide, relates them to the
//! capacity left after kubelet overhead, and grades the result. Limits come
//! out as scalars unless a service carries dynamic-limit bounds, in which
//! case every limit-derived figure becomes a `{min, max}` range.

use std::collections::BTreeMap;

use serde::Serialize;

use sizer_core::resources::allocatable;
use sizer_core::types::{LimitValue, Node, RiskLevel, Service, ServiceId};

use crate::service;

/// Requested/limit sums and over-commit grading for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOverCommit {
    #[serde(rename = "requestedCPU")]
    pub requested_cpu: f64,
    pub requested_memory: f64,
    #[serde(rename = "limitCPU")]
    pub limit_cpu: LimitValue,
    pub limit_memory: LimitValue,
    #[serde(rename = "cpuRatio")]
    pub cpu_ratio: LimitValue,
    pub memory_ratio: LimitValue,
    pub risk_level: RiskLevel,
}

/// Cluster-wide over-commit figures, weighted by placement counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOverCommit {
    #[serde(rename = "requestedCPU")]
    pub requested_cpu: f64,
    pub requested_memory: f64,
    #[serde(rename = "limitCPU")]
    pub limit_cpu: LimitValue,
    pub limit_memory: LimitValue,
    #[serde(rename = "allocatableCPU")]
    pub allocatable_cpu: f64,
    pub allocatable_memory: f64,
    #[serde(rename = "cpuRatio")]
    pub cpu_ratio: LimitValue,
    pub memory_ratio: LimitValue,
    pub risk_level: RiskLevel,
}

/// Metrics for a single node against its own allocatable capacity.
pub fn node_over_commit(node: &Node, services: &[Service]) -> NodeOverCommit {
    let placed: Vec<(&Service, u32)> = node
        .services
        .iter()
        .filter_map(|&id| service(services, id))
        .map(|svc| (svc, 1))
        .collect();

    let requested_cpu: f64 = placed.iter().map(|(s, _)| s.required_cpu).sum();
    let requested_memory: f64 = placed.iter().map(|(s, _)| s.required_memory).sum();
    let (limit_cpu, limit_memory) = summed_limits(&placed);

    let (allocatable_cpu, allocatable_memory) = allocatable(node.cpu_units, node.memory);
    let cpu_ratio = ratio(limit_cpu, allocatable_cpu);
    let memory_ratio = ratio(limit_memory, allocatable_memory);

    NodeOverCommit {
        requested_cpu,
        requested_memory,
        limit_cpu,
        limit_memory,
        cpu_ratio,
        memory_ratio,
        risk_level: RiskLevel::from_ratio(cpu_ratio.max_bound().max(memory_ratio.max_bound())),
    }
}

/// Metrics for the whole cluster. Each service weighs in once per placement
/// (its id may appear on several nodes), against the sum of every node's
/// allocatable capacity.
pub fn cluster_over_commit(nodes: &[Node], services: &[Service]) -> ClusterOverCommit {
    let mut placement_counts: BTreeMap<ServiceId, u32> = BTreeMap::new();
    for node in nodes {
        for &sid in &node.services {
            *placement_counts.entry(sid).or_insert(0) += 1;
        }
    }
    let placed: Vec<(&Service, u32)> = placement_counts
        .iter()
        .filter_map(|(&sid, &count)| service(services, sid).map(|svc| (svc, count)))
        .collect();

    let requested_cpu: f64 = placed.iter().map(|(s, c)| s.required_cpu * f64::from(*c)).sum();
    let requested_memory: f64 = placed
        .iter()
        .map(|(s, c)| s.required_memory * f64::from(*c))
        .sum();
    let (limit_cpu, limit_memory) = summed_limits(&placed);

    let mut allocatable_cpu = 0.0;
    let mut allocatable_memory = 0.0;
    for node in nodes {
        let (cpu, memory) = allocatable(node.cpu_units, node.memory);
        allocatable_cpu += cpu;
        allocatable_memory += memory;
    }

    let cpu_ratio = ratio(limit_cpu, allocatable_cpu);
    let memory_ratio = ratio(limit_memory, allocatable_memory);

    ClusterOverCommit {
        requested_cpu,
        requested_memory,
        limit_cpu,
        limit_memory,
        allocatable_cpu,
        allocatable_memory,
        cpu_ratio,
        memory_ratio,
        risk_level: RiskLevel::from_ratio(cpu_ratio.max_bound().max(memory_ratio.max_bound())),
    }
}

/// Sum limits across `(service, placement count)` pairs.
///
/// Scalars unless any service defines a dynamic-limit bound. Per service,
/// the range bounds default `min*`/`max*` → `limit*` → `required*`.
fn summed_limits(placed: &[(&Service, u32)]) -> (LimitValue, LimitValue) {
    let any_range = placed.iter().any(|(svc, _)| svc.has_dynamic_limits());

    if any_range {
        let mut min_cpu = 0.0;
        let mut max_cpu = 0.0;
        let mut min_memory = 0.0;
        let mut max_memory = 0.0;
        for (svc, count) in placed {
            let weight = f64::from(*count);
            let base_cpu = svc.limit_cpu.unwrap_or(svc.required_cpu);
            let base_memory = svc.limit_memory.unwrap_or(svc.required_memory);
            min_cpu += weight * svc.min_limit_cpu.unwrap_or(base_cpu);
            max_cpu += weight * svc.max_limit_cpu.unwrap_or(base_cpu);
            min_memory += weight * svc.min_limit_memory.unwrap_or(base_memory);
            max_memory += weight * svc.max_limit_memory.unwrap_or(base_memory);
        }
        (
            LimitValue::Range { min: min_cpu, max: max_cpu },
            LimitValue::Range { min: min_memory, max: max_memory },
        )
    } else {
        let mut cpu = 0.0;
        let mut memory = 0.0;
        for (svc, count) in placed {
            let weight = f64::from(*count);
            cpu += weight * svc.limit_cpu.unwrap_or(svc.required_cpu);
            memory += weight * svc.limit_memory.unwrap_or(svc.required_memory);
        }
        (LimitValue::Scalar(cpu), LimitValue::Scalar(memory))
    }
}

fn ratio(limit: LimitValue, allocatable: f64) -> LimitValue {
    if allocatable > 0.0 {
        limit.div(allocatable)
    } else {
        LimitValue::Scalar(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sizer_core::types::{OverCommitMode, ReservedCapacity};

    fn make_service(id: u32, cpu: f64, memory: f64) -> Service {
        Service {
            id,
            name: format!("svc-{id}"),
            required_cpu: cpu,
            required_memory: memory,
            limit_cpu: None,
            limit_memory: None,
            min_limit_cpu: None,
            max_limit_cpu: None,
            min_limit_memory: None,
            max_limit_memory: None,
            over_commit_mode: OverCommitMode::None,
            zones: 1,
            runs_with: Vec::new(),
            avoid: Vec::new(),
            owner: Some(0),
        }
    }

    fn make_node(id: u32, cpu: u32, memory: u32, placed: Vec<u32>) -> Node {
        Node {
            id,
            machine_set: "worker".to_string(),
            cpu_units: cpu,
            memory,
            max_disks: 24,
            instance_name: String::new(),
            only_for: Vec::new(),
            services: placed,
            is_control_plane: false,
            allow_workload_scheduling: false,
            control_plane_reserved: ReservedCapacity::ZERO,
        }
    }

    #[test]
    fn limits_default_to_requests() {
        let services = vec![make_service(0, 2.0, 8.0), make_service(1, 1.0, 4.0)];
        let node = make_node(0, 16, 64, vec![0, 1]);

        let metrics = node_over_commit(&node, &services);
        assert_eq!(metrics.requested_cpu, 3.0);
        assert_eq!(metrics.requested_memory, 12.0);
        assert_eq!(metrics.limit_cpu, LimitValue::Scalar(3.0));
        assert_eq!(metrics.limit_memory, LimitValue::Scalar(12.0));
        assert_eq!(metrics.risk_level, RiskLevel::None);
    }

    #[test]
    fn static_limits_sum_as_scalars() {
        let mut a = make_service(0, 2.0, 8.0);
        a.limit_cpu = Some(8.0);
        a.limit_memory = Some(32.0);
        let mut b = make_service(1, 2.0, 8.0);
        b.limit_cpu = Some(8.0);
        b.limit_memory = Some(32.0);
        let services = vec![a, b];
        let node = make_node(0, 8, 32, vec![0, 1]);

        let metrics = node_over_commit(&node, &services);
        assert_eq!(metrics.limit_cpu, LimitValue::Scalar(16.0));
        assert_eq!(metrics.limit_memory, LimitValue::Scalar(64.0));
        // 16 / (8 - 0.09) ≈ 2.02 and 64 / (32 - 1.77) ≈ 2.12: medium.
        assert_eq!(metrics.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn dynamic_bounds_turn_limits_into_ranges() {
        let mut svc = make_service(0, 2.0, 8.0);
        svc.min_limit_cpu = Some(4.0);
        svc.max_limit_cpu = Some(8.0);
        svc.min_limit_memory = Some(16.0);
        svc.max_limit_memory = Some(32.0);
        svc.over_commit_mode = OverCommitMode::Dynamic;
        let services = vec![svc];
        let node = make_node(0, 16, 64, vec![0]);

        let metrics = node_over_commit(&node, &services);
        assert_eq!(metrics.requested_cpu, 2.0);
        assert_eq!(metrics.limit_cpu, LimitValue::Range { min: 4.0, max: 8.0 });
        assert_eq!(metrics.limit_memory, LimitValue::Range { min: 16.0, max: 32.0 });
        assert_eq!(metrics.risk_level, RiskLevel::None);

        match metrics.cpu_ratio {
            LimitValue::Range { min, max } => {
                assert!(min > 0.0 && max < 1.0);
            }
            other => panic!("expected a range ratio, got {other:?}"),
        }
    }

    #[test]
    fn one_dynamic_service_makes_the_whole_node_ranged() {
        let plain = make_service(0, 1.0, 2.0);
        let mut dynamic = make_service(1, 1.0, 2.0);
        dynamic.min_limit_cpu = Some(2.0);
        dynamic.max_limit_cpu = Some(4.0);
        let services = vec![plain, dynamic];
        let node = make_node(0, 16, 64, vec![0, 1]);

        let metrics = node_over_commit(&node, &services);
        // The plain service contributes its request to both bounds.
        assert_eq!(metrics.limit_cpu, LimitValue::Range { min: 3.0, max: 5.0 });
        assert_eq!(metrics.limit_memory, LimitValue::Range { min: 4.0, max: 4.0 });
    }

    #[test]
    fn risk_follows_worst_dimension() {
        let mut svc = make_service(0, 1.0, 2.0);
        svc.limit_cpu = Some(1.0);
        // Memory limit far above allocatable: (64 - 5.23) * 5.
        svc.limit_memory = Some(300.0);
        let services = vec![svc];
        let node = make_node(0, 16, 64, vec![0]);

        let metrics = node_over_commit(&node, &services);
        assert_eq!(metrics.risk_level, RiskLevel::High);
    }

    #[test]
    fn cluster_metrics_weight_by_placement_count() {
        let mut svc = make_service(0, 2.0, 4.0);
        svc.limit_cpu = Some(4.0);
        svc.limit_memory = Some(8.0);
        let services = vec![svc];
        // The same service replicated onto three nodes.
        let nodes = vec![
            make_node(0, 16, 64, vec![0]),
            make_node(1, 16, 64, vec![0]),
            make_node(2, 16, 64, vec![0]),
        ];

        let metrics = cluster_over_commit(&nodes, &services);
        assert_eq!(metrics.requested_cpu, 6.0);
        assert_eq!(metrics.requested_memory, 12.0);
        assert_eq!(metrics.limit_cpu, LimitValue::Scalar(12.0));
        assert_eq!(metrics.limit_memory, LimitValue::Scalar(24.0));
        assert!((metrics.allocatable_cpu - 3.0 * (16.0 - 0.11)).abs() < 1e-9);
        assert_eq!(metrics.risk_level, RiskLevel::None);
    }

    #[test]
    fn empty_cluster_reports_zero_risk() {
        let metrics = cluster_over_commit(&[], &[]);
        assert_eq!(metrics.requested_cpu, 0.0);
        assert_eq!(metrics.limit_cpu, LimitValue::Scalar(0.0));
        assert_eq!(metrics.risk_level, RiskLevel::None);
    }
}
