//! Domain models for jobgrid.
//!
//! Canonical definitions for the configuration records and resolved jobs:
//! - `Platform`, `Provider`: where jobs run
//! - `TaskVariant`, `Variants`: configuration axes and resolved combinations
//! - `Task`, `Project`: what runs, and the tree that says where
//! - `Job`: a resolved, named unit the job store keeps a definition for

pub mod error;
pub mod job;
pub mod platform;
pub mod project;
pub mod task;
pub mod variant;

pub use error::{
    Collision, CollisionError, ConfigurationError, EnumerationError, JobGridError, MatrixError,
    ReconcileError, Result,
};
pub use job::{BuildJob, Job, JobKind, PullJob, TestJob};
pub use platform::{NodeUsability, Platform, PlatformProvider, Provider, TestStability};
pub use project::{
    BuildPlatformConfig, BuildVariantsConfig, JdkProject, JdkTestProject, Product, Project,
    TestPlatformConfig, TestTaskConfig,
};
pub use task::{BinaryRequirement, FileRequirements, MachinePreference, Task, BUILD_TASK_ID};
pub use variant::{TaskKind, TaskVariant, TaskVariantValue, VariantChoice, Variants};
