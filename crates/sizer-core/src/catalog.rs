//! Per-platform instance catalogs.
//!
//! Each supported platform ships a JSON catalog of machine profiles,
//! embedded at compile time and opaque to the sizing engine. Lookups for
//! unknown platforms fall back to the AWS catalog.

use serde::{Deserialize, Serialize};

use crate::error::{SizingError, SizingResult};
use crate::types::Platform;

/// One entry in a platform's machine catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    /// GB.
    pub memory: u32,
    pub cpu_units: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_storage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_disks: Option<u32>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub control_plane: bool,
    #[serde(default)]
    pub odf_default: bool,
}

fn catalog_json(platform: Platform) -> &'static str {
    match platform {
        Platform::BareMetal => include_str!("../data/baremetal.json"),
        Platform::Gcp => include_str!("../data/gcp.json"),
        Platform::Azure => include_str!("../data/azure.json"),
        Platform::VMware => include_str!("../data/vmware.json"),
        Platform::Rhv => include_str!("../data/rhv.json"),
        Platform::Aws => include_str!("../data/aws.json"),
        Platform::IbmClassic => include_str!("../data/ibm-classic.json"),
        Platform::IbmVpc => include_str!("../data/ibm-vpc.json"),
    }
}

/// All machine profiles available on `platform`.
pub fn instances_for_platform(platform: Platform) -> SizingResult<Vec<Instance>> {
    serde_json::from_str(catalog_json(platform))
        .map_err(|e| SizingError::Internal(format!("catalog for {platform} is malformed: {e}")))
}

/// The platform's default machine profile: the entry marked `default`,
/// or the first entry when none is marked.
pub fn default_instance_for_platform(platform: Platform) -> SizingResult<Instance> {
    let instances = instances_for_platform(platform)?;
    instances
        .iter()
        .find(|i| i.default)
        .or_else(|| instances.first())
        .cloned()
        .ok_or_else(|| SizingError::Internal(format!("catalog for {platform} is empty")))
}
