//! Error types for jobgrid-store

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the job store and notifier layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// No active definition with this name
    #[error("job not found: {name}")]
    NotFound { name: String },

    /// An active definition with this name already exists
    #[error("job already exists: {name}")]
    AlreadyExists { name: String },

    /// No archived definition with this name
    #[error("job not archived: {name}")]
    NotArchived { name: String },

    /// Name cannot be used as a store key
    #[error("invalid job name: {name:?}")]
    InvalidName { name: String },

    /// Filesystem failure
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Live scheduler could not be notified
    #[error("scheduler notification failed: {0}")]
    Notify(String),

    /// Backend-specific failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True when the error means the requested change is already in place
    /// (or its precondition was consumed by an earlier, identical call).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. }
                | StoreError::AlreadyExists { .. }
                | StoreError::NotArchived { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_classification() {
        assert!(StoreError::AlreadyExists { name: "a".into() }.is_conflict());
        assert!(StoreError::NotArchived { name: "a".into() }.is_conflict());
        assert!(!StoreError::Backend("boom".into()).is_conflict());
        assert!(!StoreError::InvalidName { name: "../x".into() }.is_conflict());
    }

    #[test]
    fn io_error_display_names_path() {
        let err = StoreError::io(
            "/tmp/jobs/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/jobs/x"));
        assert!(msg.contains("denied"));
    }
}
