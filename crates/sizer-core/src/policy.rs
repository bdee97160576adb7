//! Control-plane detection policy.
//!
//! Control-plane services are recognized by name substrings. The list is
//! policy, not a hard-coded rule: deployments with renamed control-plane
//! components can load their own list from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Machine sets with one of these names produce control-plane nodes.
const CONTROL_PLANE_MACHINE_SET_NAMES: [&str; 2] = ["controlPlane", "control-plane"];

/// Name substrings that mark a service as a control-plane component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlanePolicy {
    pub markers: Vec<String>,
}

impl Default for ControlPlanePolicy {
    fn default() -> Self {
        Self {
            markers: [
                "kube-apiserver",
                "etcd",
                "kube-controller-manager",
                "kube-scheduler",
                "cluster-version-operator",
                "control-plane",
                "controlplane",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl ControlPlanePolicy {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: ControlPlanePolicy = toml::from_str(&content)?;
        Ok(policy)
    }

    /// True when the service name contains any marker (case-insensitive).
    pub fn is_control_plane_service(&self, service_name: &str) -> bool {
        let name = service_name.to_ascii_lowercase();
        self.markers
            .iter()
            .any(|marker| name.contains(&marker.to_ascii_lowercase()))
    }
}

/// True when a machine set of this name produces control-plane nodes.
pub fn is_control_plane_machine_set(name: &str) -> bool {
    CONTROL_PLANE_MACHINE_SET_NAMES.contains(&name)
}
