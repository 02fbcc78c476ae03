//! jobgrid core library
//!
//! Models the job space of a CI fleet (platforms × providers × projects or
//! tasks × variant combinations) and keeps a job store in step with it:
//!
//! - `config`: validated, read-only configuration cache, reader and settings
//! - `spec` / `enumerate`: axis model and deterministic enumeration
//! - `matrix`: coverage grid of build specs against test specs
//! - `generator` / `render`: jobs from project trees, definition documents
//! - `reconcile`: pure planning plus bounded-concurrency application
//! - `modify`: modifiers, bumpers and collision handling

pub mod config;
pub mod context;
pub mod domain;
pub mod enumerate;
pub mod generator;
pub mod matrix;
pub mod modify;
pub mod obs;
pub mod reconcile;
pub mod render;
pub mod spec;
pub mod telemetry;

pub use config::{ConfigCache, ConfigReader, ConfigSnapshot, DirConfigReader, Settings};
pub use context::RunContext;
pub use domain::{
    BuildJob, Collision, CollisionError, ConfigurationError, EnumerationError, Job, JobGridError,
    JobKind, MatrixError, Platform, Product, Project, PullJob, ReconcileError, Result, Task,
    TaskKind, TaskVariant, TestJob, Variants,
};
pub use enumerate::{cartesian, Enumerator, SpecQuery};
pub use generator::{generate_all, ConfigTreeGenerator, JobGenerator};
pub use matrix::{render_plain, AxisSpecs, Leaf, Matrix, MatrixBuilder};
pub use modify::{
    bump, modify_all, modify_job, BumpOutcome, BumpScope, CollisionPolicy, JobModifier,
    Modification, PlatformBumper, ProductBumper, ProviderBumper, VariantRemover,
};
pub use reconcile::{
    plan_actions, DeployedJobs, JobAction, JobUpdateResult, JobUpdateResults, ReconcilePlan,
    ReconcileReport, Reconciler, StoreState,
};
pub use render::{JobRenderer, JsonJobRenderer};
pub use spec::{BuildSpec, EqualityFilter, Spec, SpecKey, TestSpec, VariantMask};
pub use telemetry::init_tracing;
