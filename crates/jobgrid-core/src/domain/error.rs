//! Domain-level error taxonomy for jobgrid.
//!
//! Errors that stop an operation before it starts are raised. Failures of
//! individual jobs during reconciliation or bumping are returned as data
//! (`JobUpdateResults`, `BumpOutcome`) instead.

use std::path::PathBuf;

use jobgrid_store::StoreError;

use crate::domain::variant::TaskKind;

/// Malformed or inconsistent configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{referenced_by} references unknown platform {platform}")]
    UnknownPlatform {
        referenced_by: String,
        platform: String,
    },

    #[error("{referenced_by} references unknown provider {provider}")]
    UnknownProvider {
        referenced_by: String,
        provider: String,
    },

    #[error("{referenced_by} references unknown task {task}")]
    UnknownTask { referenced_by: String, task: String },

    #[error("{referenced_by} references unknown task variant {category}")]
    UnknownVariant {
        referenced_by: String,
        category: String,
    },

    #[error("{referenced_by} references unknown value {value} of task variant {category}")]
    UnknownVariantValue {
        referenced_by: String,
        category: String,
        value: String,
    },

    #[error("{referenced_by} uses {found} item {id} where a {expected} one is required")]
    WrongKind {
        referenced_by: String,
        id: String,
        expected: TaskKind,
        found: TaskKind,
    },

    #[error("invalid exclusion pattern {pattern:?} on {category}={value}: {reason}")]
    InvalidExclusion {
        category: String,
        value: String,
        pattern: String,
        reason: String,
    },

    #[error("project {project} builds on {platform} without a provider")]
    MissingProvider { project: String, platform: String },

    #[error("test project {project} declares provider {provider} for build platform {platform}")]
    UnexpectedProvider {
        project: String,
        platform: String,
        provider: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Invariant violation while enumerating the job space.
#[derive(Debug, thiserror::Error)]
pub enum EnumerationError {
    #[error("task variant {category} has no values")]
    EmptyVariant { category: String },

    #[error("invalid inclusion pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Matrix request rejected before traversal.
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    #[error("matrix rows and columns are both {kind} specs")]
    SameAxisKind { kind: &'static str },
}

/// A reconciliation run that never started.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("duplicate job name in desired set: {name}")]
    DuplicateJobName { name: String },

    #[error("failed to render job {job}: {reason}")]
    Render { job: String, reason: String },

    #[error("failed to parse job definition: {reason}")]
    Parse { reason: String },

    #[error("failed to read job store state: {0}")]
    Store(#[from] StoreError),
}

/// A bumped job whose new name is already taken.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Collision {
    /// Name before the bump.
    pub original: String,
    /// Name the bump would have produced.
    pub bumped: String,
    /// Original names of the other jobs that claimed `bumped`.
    pub conflicts_with: Vec<String>,
}

/// A bump aborted under the stop-on-collision policy; nothing was applied.
#[derive(Debug, thiserror::Error)]
#[error("bump aborted: {} naming collision(s), first: {}", collisions.len(), first_collision(collisions))]
pub struct CollisionError {
    pub collisions: Vec<Collision>,
}

fn first_collision(collisions: &[Collision]) -> String {
    collisions
        .first()
        .map(|c| format!("{} -> {}", c.original, c.bumped))
        .unwrap_or_default()
}

/// Top-level error for callers that drive several stages in one go.
#[derive(Debug, thiserror::Error)]
pub enum JobGridError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("enumeration error: {0}")]
    Enumeration(#[from] EnumerationError),

    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("collision error: {0}")]
    Collision(#[from] CollisionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for jobgrid domain operations.
pub type Result<T> = std::result::Result<T, JobGridError>;
