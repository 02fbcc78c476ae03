use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::storage_traits::{validate_job_name, JobRecord, JobStore, StoreResult};

/// File holding the definition inside a job directory.
pub const DEFINITION_FILE: &str = "config.xml";

const STAGING_FILE: &str = ".config.xml.tmp";

/// Holds an older archived copy while its replacement moves in. Job names
/// never start with a dot, so this never shadows a job.
const REPLACED_DIR: &str = ".replaced";

/// Filesystem-backed job store.
///
/// Layout: `<jobs_dir>/<name>/config.xml` for active jobs and
/// `<archive_dir>/<name>/config.xml` for archived ones. Both directories
/// should live on the same filesystem so archiving is a single rename.
pub struct FsJobStore {
    jobs_dir: PathBuf,
    archive_dir: PathBuf,
}

impl FsJobStore {
    /// Create a store over `jobs_dir` and `archive_dir`, creating both if needed.
    pub async fn open(
        jobs_dir: impl AsRef<Path>,
        archive_dir: impl AsRef<Path>,
    ) -> StoreResult<Self> {
        let jobs_dir = jobs_dir.as_ref().to_path_buf();
        let archive_dir = archive_dir.as_ref().to_path_buf();
        fs::create_dir_all(&jobs_dir)
            .await
            .map_err(|e| StoreError::io(&jobs_dir, e))?;
        fs::create_dir_all(&archive_dir)
            .await
            .map_err(|e| StoreError::io(&archive_dir, e))?;
        Ok(Self {
            jobs_dir,
            archive_dir,
        })
    }

    fn active_dir(&self, name: &str) -> PathBuf {
        self.jobs_dir.join(name)
    }

    fn archived_dir(&self, name: &str) -> PathBuf {
        self.archive_dir.join(name)
    }

    async fn has_definition(dir: &Path) -> bool {
        fs::metadata(dir.join(DEFINITION_FILE))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Write via a staging file and rename, so readers never see a torn file.
    async fn write_definition(dir: &Path, definition: &str) -> StoreResult<()> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::io(dir, e))?;
        let staging = dir.join(STAGING_FILE);
        let target = dir.join(DEFINITION_FILE);
        fs::write(&staging, definition)
            .await
            .map_err(|e| StoreError::io(&staging, e))?;
        fs::rename(&staging, &target)
            .await
            .map_err(|e| StoreError::io(&target, e))
    }

    /// Move `from` to `target`. An existing `target` is parked at `aside`
    /// first and put back if the move fails, so it is only deleted once its
    /// replacement is in place.
    async fn replace_dir(from: &Path, target: &Path, aside: &Path) -> StoreResult<()> {
        let replacing = fs::metadata(target).await.is_ok();
        if replacing {
            if let Some(parent) = aside.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::io(parent, e))?;
            }
            if fs::metadata(aside).await.is_ok() {
                fs::remove_dir_all(aside)
                    .await
                    .map_err(|e| StoreError::io(aside, e))?;
            }
            fs::rename(target, aside)
                .await
                .map_err(|e| StoreError::io(aside, e))?;
        }

        if let Err(e) = fs::rename(from, target).await {
            if replacing {
                if let Err(restore) = fs::rename(aside, target).await {
                    warn!(path = %aside.display(), error = %restore, "older archived copy left aside");
                }
            }
            return Err(StoreError::io(target, e));
        }

        if replacing {
            if let Err(e) = fs::remove_dir_all(aside).await {
                warn!(path = %aside.display(), error = %e, "failed to remove replaced archive copy");
            }
        }
        Ok(())
    }

    async fn list_dir(root: &Path) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(root)
            .await
            .map_err(|e| StoreError::io(root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(root, e))?
        {
            if !Self::has_definition(&entry.path()).await {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl JobStore for FsJobStore {
    async fn exists(&self, name: &str) -> StoreResult<bool> {
        validate_job_name(name)?;
        Ok(Self::has_definition(&self.active_dir(name)).await)
    }

    async fn read(&self, name: &str) -> StoreResult<JobRecord> {
        validate_job_name(name)?;
        let path = self.active_dir(name).join(DEFINITION_FILE);
        match fs::read_to_string(&path).await {
            Ok(definition) => Ok(JobRecord::new(name, definition)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn create(&self, name: &str, definition: &str) -> StoreResult<()> {
        if self.exists(name).await? {
            return Err(StoreError::AlreadyExists {
                name: name.to_string(),
            });
        }
        debug!(job = %name, "creating job definition");
        Self::write_definition(&self.active_dir(name), definition).await
    }

    async fn update(&self, name: &str, definition: &str) -> StoreResult<()> {
        if !self.exists(name).await? {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        debug!(job = %name, "updating job definition");
        Self::write_definition(&self.active_dir(name), definition).await
    }

    async fn archive(&self, name: &str) -> StoreResult<()> {
        if !self.exists(name).await? {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        let target = self.archived_dir(name);
        let aside = self.archive_dir.join(REPLACED_DIR).join(name);
        debug!(job = %name, "archiving job definition");
        Self::replace_dir(&self.active_dir(name), &target, &aside).await
    }

    async fn revive(&self, name: &str, definition: &str) -> StoreResult<()> {
        if self.exists(name).await? {
            return Err(StoreError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let archived = self.archived_dir(name);
        if !Self::has_definition(&archived).await {
            return Err(StoreError::NotArchived {
                name: name.to_string(),
            });
        }
        debug!(job = %name, "reviving job definition");
        let active = self.active_dir(name);
        fs::rename(&archived, &active)
            .await
            .map_err(|e| StoreError::io(&active, e))?;
        Self::write_definition(&active, definition).await
    }

    async fn list_active(&self) -> StoreResult<Vec<String>> {
        Self::list_dir(&self.jobs_dir).await
    }

    async fn list_archived(&self) -> StoreResult<Vec<String>> {
        Self::list_dir(&self.archive_dir).await
    }
}
