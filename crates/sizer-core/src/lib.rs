//! sizer-core — shared model for cluster sizing.
//!
//! Provides the pieces every other crate builds on:
//!
//! - Domain types: machine sets, services, workloads, nodes, zones
//! - Resource accounting: request footprints, kubelet overhead, capacity checks
//! - Per-platform instance catalogs (embedded JSON, opaque data)
//! - The control-plane detection policy
//! - The sizing error taxonomy and per-run id allocation

pub mod catalog;
pub mod error;
pub mod ids;
pub mod policy;
pub mod resources;
pub mod types;

pub use catalog::{default_instance_for_platform, instances_for_platform, Instance};
pub use error::{SizingError, SizingResult};
pub use ids::IdAllocator;
pub use policy::{is_control_plane_machine_set, ControlPlanePolicy};
pub use resources::{
    allocatable, can_support, kubelet_overhead, total_request, KubeletOverhead,
    ResourceFootprint, DISK_SERVICE_MARKER,
};
pub use types::{
    LimitValue, MachineSet, Node, NodeId, OverCommitMode, Platform, ReservedCapacity, RiskLevel,
    Service, ServiceDescriptor, ServiceId, Workload, WorkloadDescriptor, WorkloadId, Zone, ZoneId,
};
