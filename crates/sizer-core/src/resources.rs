//! Resource accounting.
//!
//! Sums service requests into a footprint, models the kubelet's reserved
//! capacity, and answers whether a node can take on additional load.
//! Requests (not limits) drive all scheduling decisions; limits only feed
//! over-commit reporting.

use crate::types::{Node, Service};

/// Services whose name contains this marker consume one attachable disk each.
pub const DISK_SERVICE_MARKER: &str = "Ceph_OSD";

/// Aggregate resource demand of a set of services.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceFootprint {
    pub cpu: f64,
    /// GB.
    pub memory: f64,
    pub disks: u32,
}

impl ResourceFootprint {
    /// Combined cpu + memory weight, used to order bundles heaviest-first.
    pub fn weight(&self) -> f64 {
        self.cpu + self.memory
    }
}

/// Sum the requests of `services`. Disk demand counts one disk per service
/// whose name contains [`DISK_SERVICE_MARKER`] (case-sensitive).
pub fn total_request<'a>(services: impl IntoIterator<Item = &'a Service>) -> ResourceFootprint {
    let mut total = ResourceFootprint::default();
    for svc in services {
        total.cpu += svc.required_cpu;
        total.memory += svc.required_memory;
        if svc.name.contains(DISK_SERVICE_MARKER) {
            total.disks += 1;
        }
    }
    total
}

/// Capacity the kubelet reserves for itself on a node of the given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KubeletOverhead {
    pub cpu: f64,
    /// GB.
    pub memory: f64,
}

/// Reserved capacity as a pure function of node size.
///
/// CPU follows the Kubernetes tiered percentages: 6% of the first core,
/// 1% of the second, 0.5% of cores three and four, 0.25% of every core
/// above four. Memory interpolates the observed reservation table below.
pub fn kubelet_overhead(cpu_units: u32, memory_gb: u32) -> KubeletOverhead {
    KubeletOverhead {
        cpu: reserved_cpu(cpu_units),
        memory: reserved_memory(memory_gb),
    }
}

/// Node capacity remaining after the kubelet's reservation.
///
/// Positive for every supported node size.
pub fn allocatable(cpu_units: u32, memory_gb: u32) -> (f64, f64) {
    let overhead = kubelet_overhead(cpu_units, memory_gb);
    (
        f64::from(cpu_units) - overhead.cpu,
        f64::from(memory_gb) - overhead.memory,
    )
}

fn reserved_cpu(cores: u32) -> f64 {
    let c = f64::from(cores);
    let mut reserved = 0.06 * c.min(1.0);
    if c > 1.0 {
        reserved += 0.01 * (c - 1.0).min(1.0);
    }
    if c > 2.0 {
        reserved += 0.005 * (c - 2.0).min(2.0);
    }
    if c > 4.0 {
        reserved += 0.0025 * (c - 4.0);
    }
    reserved
}

/// Observed kubelet memory reservations (capacity GB, reserved GB).
/// Values between anchors interpolate linearly; beyond the last anchor the
/// final segment's slope extrapolates.
const MEMORY_RESERVATION_ANCHORS: &[(f64, f64)] = &[
    (0.0, 0.0),
    (4.0, 0.6),
    (8.0, 0.8),
    (16.0, 1.1),
    (32.0, 1.77),
    (64.0, 5.23),
    (128.0, 12.16),
];

fn reserved_memory(memory_gb: u32) -> f64 {
    let m = f64::from(memory_gb);
    let anchors = MEMORY_RESERVATION_ANCHORS;

    for window in anchors.windows(2) {
        let (lo_cap, lo_res) = window[0];
        let (hi_cap, hi_res) = window[1];
        if m <= hi_cap {
            let t = (m - lo_cap) / (hi_cap - lo_cap);
            return lo_res + t * (hi_res - lo_res);
        }
    }

    // Extrapolate past the table with the last segment's slope.
    let (lo_cap, lo_res) = anchors[anchors.len() - 2];
    let (hi_cap, hi_res) = anchors[anchors.len() - 1];
    let slope = (hi_res - lo_res) / (hi_cap - lo_cap);
    hi_res + (m - hi_cap) * slope
}

/// True iff `node` can take `requirement` on top of `usage`, leaving room
/// for the kubelet's reservation.
pub fn can_support(requirement: &ResourceFootprint, usage: &ResourceFootprint, node: &Node) -> bool {
    let kubelet = kubelet_overhead(node.cpu_units, node.memory);
    requirement.cpu + usage.cpu + kubelet.cpu <= f64::from(node.cpu_units)
        && requirement.memory + usage.memory + kubelet.memory <= f64::from(node.memory)
        && requirement.disks + usage.disks <= node.max_disks
}
