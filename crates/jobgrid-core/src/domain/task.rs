//! Tasks: what a job does on a platform.

use serde::{Deserialize, Serialize};

use crate::domain::variant::TaskKind;

/// Id of the synthetic task that stands for "build the project".
pub const BUILD_TASK_ID: &str = "build";

/// Where a task prefers to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachinePreference {
    #[default]
    Vm,
    VmOnly,
    Hw,
    HwOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BinaryRequirement {
    #[default]
    None,
    Binary,
    Binaries,
}

/// Artifacts a task needs copied into its workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequirements {
    #[serde(default)]
    pub source: bool,

    #[serde(default)]
    pub binary: BinaryRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: TaskKind,

    #[serde(default)]
    pub machine_preference: MachinePreference,

    #[serde(default)]
    pub file_requirements: FileRequirements,

    #[serde(default)]
    pub script: String,

    #[serde(default)]
    pub timeout_hours: u32,
}

impl Task {
    /// The synthetic build task, present in every configuration.
    pub fn build() -> Self {
        Self {
            id: BUILD_TASK_ID.to_string(),
            kind: TaskKind::Build,
            machine_preference: MachinePreference::Vm,
            file_requirements: FileRequirements {
                source: true,
                binary: BinaryRequirement::None,
            },
            script: String::new(),
            timeout_hours: 0,
        }
    }

    pub fn is_build_task(&self) -> bool {
        self.id == BUILD_TASK_ID
    }
}
