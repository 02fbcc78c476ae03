//! Job definition documents.

use crate::domain::{Job, ReconcileError};

/// Turns a resolved job into the definition document stored for it.
///
/// Rendering must be deterministic: the reconciler compares rendered
/// documents to decide between update and no-op.
pub trait JobRenderer: Send + Sync {
    fn render(&self, job: &Job) -> Result<String, ReconcileError>;

    /// Read a stored definition back into the job it was rendered from.
    fn parse(&self, definition: &str) -> Result<Job, ReconcileError>;
}

/// Renders a job as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonJobRenderer;

impl JobRenderer for JsonJobRenderer {
    fn render(&self, job: &Job) -> Result<String, ReconcileError> {
        let mut text = serde_json::to_string_pretty(job).map_err(|e| ReconcileError::Render {
            job: job.name(),
            reason: e.to_string(),
        })?;
        text.push('\n');
        Ok(text)
    }

    fn parse(&self, definition: &str) -> Result<Job, ReconcileError> {
        serde_json::from_str(definition).map_err(|e| ReconcileError::Parse {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Product, PullJob};

    #[test]
    fn json_rendering_is_deterministic_and_tagged() {
        let job = Job::Pull(PullJob {
            project_id: "ojdk8".to_string(),
            product: Product {
                jdk: "jdk8".to_string(),
                package_name: "java-1.8.0-openjdk".to_string(),
            },
            repo_url: "https://example.org/jdk8u".to_string(),
        });
        let a = JsonJobRenderer.render(&job).unwrap();
        let b = JsonJobRenderer.render(&job).unwrap();
        assert_eq!(a, b);

        let value: serde_json::Value = serde_json::from_str(&a).unwrap();
        assert_eq!(value["kind"], "pull");
        assert_eq!(value["projectId"], "ojdk8");
    }

    #[test]
    fn stored_definition_reads_back() {
        let job = Job::Pull(PullJob {
            project_id: "ojdk8".to_string(),
            product: Product {
                jdk: "jdk8".to_string(),
                package_name: "java-1.8.0-openjdk".to_string(),
            },
            repo_url: "https://example.org/jdk8u".to_string(),
        });
        let text = JsonJobRenderer.render(&job).unwrap();
        assert_eq!(JsonJobRenderer.parse(&text).unwrap(), job);

        let err = JsonJobRenderer.parse("<project/>").unwrap_err();
        assert!(matches!(err, ReconcileError::Parse { .. }));
    }
}
