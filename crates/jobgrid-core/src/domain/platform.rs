//! Platforms and build providers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A build provider (e.g. `vagrant`, `beaker`) and the nodes it owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,

    #[serde(default)]
    pub hw_nodes: Vec<String>,

    #[serde(default)]
    pub vm_nodes: Vec<String>,
}

/// A provider as declared on a specific platform, with the nodes that can
/// run that platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProvider {
    pub id: String,

    #[serde(default)]
    pub hw_nodes: Vec<String>,

    #[serde(default)]
    pub vm_nodes: Vec<String>,
}

/// Where a platform can run for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeUsability {
    Neither,
    HwOnly,
    VmOnly,
    Both,
}

/// Whether tests on this platform count towards release decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStability {
    #[serde(default)]
    pub y_stream: bool,

    #[serde(default)]
    pub z_stream: bool,
}

/// An operating system + architecture a job can run on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// OS family, e.g. `el`, `f`, `win`.
    pub os: String,

    pub version: String,

    pub architecture: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default)]
    pub providers: Vec<PlatformProvider>,

    /// Image name used when the platform runs on a VM.
    #[serde(default)]
    pub vm_name: String,

    #[serde(default)]
    pub test_stability: TestStability,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Platform {
    /// Identity of the platform, e.g. `el7.x86_64`.
    pub fn id(&self) -> String {
        format!("{}{}.{}", self.os, self.version, self.architecture)
    }

    /// OS family and version, e.g. `el7`.
    pub fn os_version(&self) -> String {
        format!("{}{}", self.os, self.version)
    }

    pub fn provider(&self, provider_id: &str) -> Option<&PlatformProvider> {
        self.providers.iter().find(|p| p.id == provider_id)
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.id.as_str())
    }

    pub fn usability(&self, provider_id: &str) -> NodeUsability {
        match self.provider(provider_id) {
            None => NodeUsability::Neither,
            Some(p) => match (p.hw_nodes.is_empty(), p.vm_nodes.is_empty()) {
                (true, true) => NodeUsability::Neither,
                (false, true) => NodeUsability::HwOnly,
                (true, false) => NodeUsability::VmOnly,
                (false, false) => NodeUsability::Both,
            },
        }
    }
}
