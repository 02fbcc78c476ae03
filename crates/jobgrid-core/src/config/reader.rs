//! Loading configuration records from persisted storage.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::ConfigSnapshot;
use crate::domain::{ConfigurationError, JdkProject, JdkTestProject, Project};

/// Source of configuration records.
#[async_trait]
pub trait ConfigReader: Send + Sync {
    async fn read_snapshot(&self) -> Result<ConfigSnapshot, ConfigurationError>;
}

/// Reads one JSON record per `*.json` file from a directory tree:
///
/// ```text
/// <root>/platforms/        Platform
/// <root>/buildProviders/   Provider
/// <root>/tasks/            Task
/// <root>/taskVariants/     TaskVariant
/// <root>/jdkProjects/      JdkProject
/// <root>/jdkTestProjects/  JdkTestProject
/// ```
///
/// Files load in file-name order. A missing subdirectory is an empty
/// collection.
#[derive(Debug, Clone)]
pub struct DirConfigReader {
    root: PathBuf,
}

impl DirConfigReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn load<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, ConfigurationError> {
        let dir = self.root.join(dir);
        let mut files = Vec::new();

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(ConfigurationError::Read { path: dir, source }),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ConfigurationError::Read {
                path: dir.clone(),
                source,
            })?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        let mut records = Vec::with_capacity(files.len());
        for path in files {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| ConfigurationError::Read {
                    path: path.clone(),
                    source,
                })?;
            let record = serde_json::from_slice(&bytes).map_err(|e| ConfigurationError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            records.push(record);
        }
        tracing::trace!(dir = %dir.display(), count = records.len(), "loaded records");
        Ok(records)
    }
}

#[async_trait]
impl ConfigReader for DirConfigReader {
    async fn read_snapshot(&self) -> Result<ConfigSnapshot, ConfigurationError> {
        let jdk_projects: Vec<JdkProject> = self.load("jdkProjects").await?;
        let jdk_test_projects: Vec<JdkTestProject> = self.load("jdkTestProjects").await?;

        let projects = jdk_projects
            .into_iter()
            .map(Project::JdkProject)
            .chain(jdk_test_projects.into_iter().map(Project::JdkTestProject))
            .collect();

        Ok(ConfigSnapshot {
            platforms: self.load("platforms").await?,
            providers: self.load("buildProviders").await?,
            tasks: self.load("tasks").await?,
            task_variants: self.load("taskVariants").await?,
            projects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    async fn write(root: &Path, dir: &str, file: &str, body: &str) {
        let dir = root.join(dir);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join(file), body).await.unwrap();
    }

    #[tokio::test]
    async fn reads_records_in_file_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "platforms",
            "b.json",
            r#"{"os": "f", "version": "29", "architecture": "x86_64"}"#,
        )
        .await;
        write(
            tmp.path(),
            "platforms",
            "a.json",
            r#"{"os": "el", "version": "7", "architecture": "x86_64"}"#,
        )
        .await;
        write(tmp.path(), "platforms", "notes.txt", "ignored").await;
        write(
            tmp.path(),
            "buildProviders",
            "vagrant.json",
            r#"{"id": "vagrant", "vmNodes": ["vm-1"]}"#,
        )
        .await;

        let snap = DirConfigReader::new(tmp.path())
            .read_snapshot()
            .await
            .unwrap();
        let ids: Vec<_> = snap.platforms.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["el7.x86_64", "f29.x86_64"]);
        assert_eq!(snap.providers.len(), 1);
        assert!(snap.tasks.is_empty());
        assert!(snap.projects.is_empty());
    }

    #[tokio::test]
    async fn reads_both_project_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "jdkProjects",
            "ojdk8.json",
            r#"{"id": "ojdk8", "url": "https://example.org/jdk8u",
                "product": {"jdk": "jdk8", "packageName": "java-1.8.0-openjdk"}}"#,
        )
        .await;
        write(
            tmp.path(),
            "jdkTestProjects",
            "tests.json",
            r#"{"id": "tests",
                "product": {"jdk": "jdk8", "packageName": "java-1.8.0-openjdk"}}"#,
        )
        .await;

        let snap = DirConfigReader::new(tmp.path())
            .read_snapshot()
            .await
            .unwrap();
        assert_eq!(snap.projects.len(), 2);
        assert!(!snap.projects[0].is_test_project());
        assert!(snap.projects[1].is_test_project());
    }

    #[tokio::test]
    async fn malformed_record_names_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "tasks", "bad.json", "{ not json").await;

        let err = DirConfigReader::new(tmp.path())
            .read_snapshot()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
