//! sizer-engine — the workload scheduler and placement engine.
//!
//! Takes expanded workloads plus a machine-set catalog and produces the
//! zones, nodes, and per-node service placements needed to host them:
//!
//! - `feasibility` — which machine sets could host a workload at all
//! - `bundles` — co-placement groups that must share a node
//! - `node` — per-node admission checks and node allocation
//! - `zones` — zone ranking and allocation
//! - `scheduler` — places one workload across zones and nodes
//! - `metrics` — per-node and cluster-wide over-commit reporting
//! - `sizing` — the facade: input expansion, validation, orchestration
//!
//! The engine is single-threaded, synchronous, and pure: a sizing call is a
//! function of its inputs, does no I/O, and owns all state it creates.

pub mod bundles;
pub mod feasibility;
pub mod metrics;
pub mod node;
pub mod scheduler;
pub mod sizing;
pub mod zones;

pub use feasibility::analyze;
pub use metrics::{cluster_over_commit, node_over_commit, ClusterOverCommit, NodeOverCommit};
pub use scheduler::schedule_workload;
pub use sizing::{size, ClusterSizing, NodeDetail};

use sizer_core::types::{Service, ServiceId, Workload, WorkloadId};

/// Look up a service by id. Ids are assigned densely at input expansion,
/// so the id doubles as an index.
pub(crate) fn service(services: &[Service], id: ServiceId) -> Option<&Service> {
    services.get(id as usize).filter(|s| s.id == id)
}

/// Look up a workload by id.
pub(crate) fn workload(workloads: &[Workload], id: WorkloadId) -> Option<&Workload> {
    workloads.iter().find(|w| w.id == id)
}

/// The workload owning a service, if any.
pub(crate) fn owner_of<'a>(svc: &Service, workloads: &'a [Workload]) -> Option<&'a Workload> {
    svc.owner.and_then(|id| workload(workloads, id))
}
