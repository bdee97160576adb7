//! Domain types for cluster sizing.
//!
//! These types represent the input descriptors (what the caller asks for),
//! the internal entities a sizing run produces (services, workloads, nodes,
//! zones), and the polymorphic limit/risk values used by over-commit
//! reporting. Everything is serializable to/from JSON.

use serde::{Deserialize, Serialize};

/// Unique identifier for a service within a sizing run.
pub type ServiceId = u32;

/// Unique identifier for a workload within a sizing run.
pub type WorkloadId = u32;

/// Unique identifier for an allocated node.
pub type NodeId = u32;

/// Unique identifier for a zone (failure domain).
pub type ZoneId = u32;

fn one() -> u32 {
    1
}

// ── Machine sets ───────────────────────────────────────────────────

/// An abstract description of a node type the sizing run may allocate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSet {
    pub name: String,
    /// Cores per node.
    pub cpu: u32,
    /// Memory per node in GB.
    pub memory: u32,
    #[serde(default)]
    pub instance_name: String,
    /// Attachable disks per node.
    #[serde(default = "default_disks")]
    pub number_of_disks: u32,
    /// Workload names this machine set is dedicated to. Empty = universal.
    #[serde(default)]
    pub only_for: Vec<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_workload_scheduling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_reserved: Option<ReservedCapacity>,
}

fn default_disks() -> u32 {
    24
}

/// Resources set aside on a node for control-plane processes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservedCapacity {
    pub cpu: f64,
    pub memory: f64,
}

impl ReservedCapacity {
    pub const ZERO: ReservedCapacity = ReservedCapacity { cpu: 0.0, memory: 0.0 };

    /// Default reservation for control-plane nodes when not set explicitly.
    pub const CONTROL_PLANE_DEFAULT: ReservedCapacity = ReservedCapacity { cpu: 2.0, memory: 4.0 };
}

// ── Input descriptors ──────────────────────────────────────────────

/// Caller-facing description of a workload: a named bundle of services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadDescriptor {
    pub name: String,
    /// Replica count. When > 1, every contained service is replicated into
    /// `count` distinct zones.
    #[serde(default = "one")]
    pub count: u32,
    /// Machine set names this workload may run on. Empty = any.
    #[serde(default)]
    pub uses_machines: Vec<String>,
    pub services: Vec<ServiceDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_control_plane: Option<bool>,
    #[serde(default)]
    pub require_control_plane: bool,
}

/// Caller-facing description of a single schedulable service.
///
/// `runsWith` and `avoid` reference sibling services *by name*; the sizing
/// facade resolves them to ids during input expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(rename = "requiredCPU", default)]
    pub required_cpu: f64,
    /// Request in GB.
    #[serde(default)]
    pub required_memory: f64,
    #[serde(rename = "limitCPU", default, skip_serializing_if = "Option::is_none")]
    pub limit_cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_memory: Option<f64>,
    #[serde(rename = "minLimitCPU", default, skip_serializing_if = "Option::is_none")]
    pub min_limit_cpu: Option<f64>,
    #[serde(rename = "maxLimitCPU", default, skip_serializing_if = "Option::is_none")]
    pub max_limit_cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_limit_memory: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_limit_memory: Option<f64>,
    #[serde(default)]
    pub over_commit_mode: OverCommitMode,
    /// Target replica count across distinct zones.
    #[serde(default = "one")]
    pub zones: u32,
    #[serde(default)]
    pub runs_with: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

/// How a service's limits participate in over-commit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverCommitMode {
    Static,
    Dynamic,
    #[default]
    None,
}

// ── Expanded entities ──────────────────────────────────────────────

/// A schedulable unit with resolved references and a run-stable id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(rename = "requiredCPU")]
    pub required_cpu: f64,
    pub required_memory: f64,
    #[serde(rename = "limitCPU", skip_serializing_if = "Option::is_none")]
    pub limit_cpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_memory: Option<f64>,
    #[serde(rename = "minLimitCPU", skip_serializing_if = "Option::is_none")]
    pub min_limit_cpu: Option<f64>,
    #[serde(rename = "maxLimitCPU", skip_serializing_if = "Option::is_none")]
    pub max_limit_cpu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_limit_memory: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit_memory: Option<f64>,
    pub over_commit_mode: OverCommitMode,
    pub zones: u32,
    /// Ids of services that must share a node with this one. Symmetric.
    pub runs_with: Vec<ServiceId>,
    /// Ids of services that must never share a node with this one.
    pub avoid: Vec<ServiceId>,
    /// Owning workload.
    pub owner: Option<WorkloadId>,
}

impl Service {
    /// True when any dynamic-limit bound is present.
    pub fn has_dynamic_limits(&self) -> bool {
        self.min_limit_cpu.is_some()
            || self.max_limit_cpu.is_some()
            || self.min_limit_memory.is_some()
            || self.max_limit_memory.is_some()
    }
}

/// A named bundle of services owned by a user-level unit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub id: WorkloadId,
    pub name: String,
    pub count: u32,
    pub uses_machines: Vec<String>,
    /// Service ids in input order.
    pub services: Vec<ServiceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_control_plane: Option<bool>,
    pub require_control_plane: bool,
}

/// An allocated machine instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub machine_set: String,
    pub cpu_units: u32,
    pub memory: u32,
    pub max_disks: u32,
    pub instance_name: String,
    pub only_for: Vec<String>,
    /// Ids of services placed on this node, in placement order.
    pub services: Vec<ServiceId>,
    pub is_control_plane: bool,
    pub allow_workload_scheduling: bool,
    pub control_plane_reserved: ReservedCapacity,
}

/// A failure domain holding zero or more nodes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub nodes: Vec<NodeId>,
}

// ── Limit values and risk ──────────────────────────────────────────

/// A limit (or ratio) that is either a scalar or a `{min, max}` range.
///
/// Nodes hosting any service with dynamic-limit bounds report ranges;
/// all other nodes report scalars. The JSON output preserves the
/// distinction (a bare number vs. an object).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Scalar(f64),
    Range { min: f64, max: f64 },
}

impl LimitValue {
    /// The worst-case bound: the value itself, or `max` for ranges.
    pub fn max_bound(&self) -> f64 {
        match *self {
            LimitValue::Scalar(v) => v,
            LimitValue::Range { max, .. } => max,
        }
    }

    /// Divide both bounds by `divisor`, preserving the scalar/range shape.
    pub fn div(&self, divisor: f64) -> LimitValue {
        match *self {
            LimitValue::Scalar(v) => LimitValue::Scalar(v / divisor),
            LimitValue::Range { min, max } => LimitValue::Range {
                min: min / divisor,
                max: max / divisor,
            },
        }
    }
}

/// Over-commitment risk, categorized from the worst-case limit ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Categorize a worst-case ratio of limits to allocatable capacity.
    pub fn from_ratio(ratio: f64) -> RiskLevel {
        if ratio <= 1.0 {
            RiskLevel::None
        } else if ratio <= 2.0 {
            RiskLevel::Low
        } else if ratio <= 4.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

// ── Platforms ──────────────────────────────────────────────────────

/// Target platform for instance catalog lookups.
///
/// Parsing is lenient: unrecognized platform names fall back to [`Platform::Aws`],
/// mirroring the catalog's fallback behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    BareMetal,
    Gcp,
    Azure,
    VMware,
    Rhv,
    Aws,
    IbmClassic,
    IbmVpc,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::BareMetal,
        Platform::Gcp,
        Platform::Azure,
        Platform::VMware,
        Platform::Rhv,
        Platform::Aws,
        Platform::IbmClassic,
        Platform::IbmVpc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::BareMetal => "BareMetal",
            Platform::Gcp => "GCP",
            Platform::Azure => "AZURE",
            Platform::VMware => "VMware",
            Platform::Rhv => "RHV",
            Platform::Aws => "AWS",
            Platform::IbmClassic => "IBM-Classic",
            Platform::IbmVpc => "IBM-VPC",
        }
    }
}

impl From<String> for Platform {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "baremetal" | "bare-metal" | "metal" => Platform::BareMetal,
            "gcp" => Platform::Gcp,
            "azure" => Platform::Azure,
            "vmware" | "vsphere" => Platform::VMware,
            "rhv" => Platform::Rhv,
            "aws" => Platform::Aws,
            "ibm-classic" | "ibmclassic" => Platform::IbmClassic,
            "ibm-vpc" | "ibmvpc" => Platform::IbmVpc,
            _ => Platform::Aws,
        }
    }
}

impl From<Platform> for String {
    fn from(p: Platform) -> String {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
