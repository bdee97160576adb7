//! Per-run id allocation.
//!
//! Every sizing call owns one allocator, so concurrent calls never
//! interfere and repeated calls over the same input produce identical ids.

use crate::types::{NodeId, ServiceId, WorkloadId, ZoneId};

/// Monotonic id counters scoped to a single sizing run.
#[derive(Debug, Default)]
pub struct IdAllocator {
    services: ServiceId,
    workloads: WorkloadId,
    nodes: NodeId,
    zones: ZoneId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_service_id(&mut self) -> ServiceId {
        let id = self.services;
        self.services += 1;
        id
    }

    pub fn next_workload_id(&mut self) -> WorkloadId {
        let id = self.workloads;
        self.workloads += 1;
        id
    }

    pub fn next_node_id(&mut self) -> NodeId {
        let id = self.nodes;
        self.nodes += 1;
        id
    }

    pub fn next_zone_id(&mut self) -> ZoneId {
        let id = self.zones;
        self.zones += 1;
        id
    }
}
