//! Storage trait definitions for jobgrid
//!
//! These traits define the two collaborators the reconciler drives:
//! - `JobStore`: active + archive areas of job definitions, keyed by job name
//! - `SchedulerNotifier`: best-effort hook telling a live scheduler what changed
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// DefinitionDigest
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of a job definition document.
///
/// Two definitions are considered identical content iff their digests match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionDigest(String);

impl DefinitionDigest {
    /// Digest of the given definition text.
    pub fn of(definition: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(definition.as_bytes());
        DefinitionDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DefinitionDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An active job definition as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub name: String,
    pub definition: String,
    pub digest: DefinitionDigest,
}

impl JobRecord {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        let definition = definition.into();
        let digest = DefinitionDigest::of(&definition);
        Self {
            name: name.into(),
            definition,
            digest,
        }
    }
}

// ---------------------------------------------------------------------------
// JobStore
// ---------------------------------------------------------------------------

/// Persisted job definitions.
///
/// Guarantees:
/// - At most one active definition per name.
/// - `archive` moves the active definition into the archive area; the name is
///   no longer active afterwards.
/// - `revive` removes the archived copy and installs the given definition as
///   active.
/// - Repeating an already-applied `create`, `archive` or `revive` fails with a
///   conflict error (`StoreError::is_conflict`) instead of duplicating state.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Whether an active definition exists for `name`.
    async fn exists(&self, name: &str) -> StoreResult<bool>;

    /// Read the active definition. `StoreError::NotFound` if absent.
    async fn read(&self, name: &str) -> StoreResult<JobRecord>;

    /// Create a new active definition. `StoreError::AlreadyExists` if active.
    async fn create(&self, name: &str, definition: &str) -> StoreResult<()>;

    /// Overwrite an active definition in place. `StoreError::NotFound` if absent.
    async fn update(&self, name: &str, definition: &str) -> StoreResult<()>;

    /// Move an active definition into the archive area. An older archived
    /// copy of the same name is replaced. `StoreError::NotFound` if not active.
    async fn archive(&self, name: &str) -> StoreResult<()>;

    /// Move a job back from the archive area using `definition`.
    /// `StoreError::AlreadyExists` if active, `StoreError::NotArchived` if
    /// there is nothing to revive.
    async fn revive(&self, name: &str, definition: &str) -> StoreResult<()>;

    /// Names of all active jobs, sorted.
    async fn list_active(&self) -> StoreResult<Vec<String>>;

    /// Names of all archived jobs, sorted.
    async fn list_archived(&self) -> StoreResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// SchedulerNotifier
// ---------------------------------------------------------------------------

/// What happened to a job, as told to a live scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyAction {
    Created,
    Updated,
    Archived,
    Revived,
}

impl NotifyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyAction::Created => "created",
            NotifyAction::Updated => "updated",
            NotifyAction::Archived => "archived",
            NotifyAction::Revived => "revived",
        }
    }
}

impl std::fmt::Display for NotifyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live scheduler hook.
///
/// Callers treat every error as non-fatal: the store is the source of truth
/// and a scheduler can always be resynchronised from it.
#[async_trait]
pub trait SchedulerNotifier: Send + Sync {
    async fn notify(&self, action: NotifyAction, job_name: &str) -> StoreResult<()>;
}

/// Reject names that cannot safely be used as a single, visible path
/// component.
pub fn validate_job_name(name: &str) -> StoreResult<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        return Err(StoreError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
