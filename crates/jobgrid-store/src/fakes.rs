//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryJobStore`, `FailingJobStore` and `RecordingNotifier`
//! that satisfy the trait contracts without touching the filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::storage_traits::*;

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

// ---------------------------------------------------------------------------
// MemoryJobStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Areas {
    active: BTreeMap<String, String>,
    archived: BTreeMap<String, String>,
}

/// In-memory job store backed by two `BTreeMap<name, definition>` areas.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    areas: Mutex<Areas>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the active area.
    pub fn with_active<I, N, D>(jobs: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        let store = Self::default();
        if let Ok(mut areas) = store.areas.lock() {
            areas.active = jobs
                .into_iter()
                .map(|(n, d)| (n.into(), d.into()))
                .collect();
        }
        store
    }

    /// Seed the archive area.
    pub fn archived_with<I, N, D>(self, jobs: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        if let Ok(mut areas) = self.areas.lock() {
            areas
                .archived
                .extend(jobs.into_iter().map(|(n, d)| (n.into(), d.into())));
        }
        self
    }

    fn areas(&self) -> StoreResult<MutexGuard<'_, Areas>> {
        self.areas.lock().map_err(poisoned)
    }

    /// Archived definition for `name`, if any.
    pub fn archived_definition(&self, name: &str) -> Option<String> {
        self.areas
            .lock()
            .ok()
            .and_then(|a| a.archived.get(name).cloned())
    }

    /// Active definition for `name`, if any.
    pub fn active_definition(&self, name: &str) -> Option<String> {
        self.areas
            .lock()
            .ok()
            .and_then(|a| a.active.get(name).cloned())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.areas()?.active.contains_key(name))
    }

    async fn read(&self, name: &str) -> StoreResult<JobRecord> {
        let areas = self.areas()?;
        areas
            .active
            .get(name)
            .map(|d| JobRecord::new(name, d.clone()))
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    async fn create(&self, name: &str, definition: &str) -> StoreResult<()> {
        validate_job_name(name)?;
        let mut areas = self.areas()?;
        if areas.active.contains_key(name) {
            return Err(StoreError::AlreadyExists {
                name: name.to_string(),
            });
        }
        areas.active.insert(name.to_string(), definition.to_string());
        Ok(())
    }

    async fn update(&self, name: &str, definition: &str) -> StoreResult<()> {
        let mut areas = self.areas()?;
        let slot = areas
            .active
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })?;
        *slot = definition.to_string();
        Ok(())
    }

    async fn archive(&self, name: &str) -> StoreResult<()> {
        let mut areas = self.areas()?;
        let definition = areas
            .active
            .remove(name)
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })?;
        areas.archived.insert(name.to_string(), definition);
        Ok(())
    }

    async fn revive(&self, name: &str, definition: &str) -> StoreResult<()> {
        let mut areas = self.areas()?;
        if areas.active.contains_key(name) {
            return Err(StoreError::AlreadyExists {
                name: name.to_string(),
            });
        }
        if areas.archived.remove(name).is_none() {
            return Err(StoreError::NotArchived {
                name: name.to_string(),
            });
        }
        areas.active.insert(name.to_string(), definition.to_string());
        Ok(())
    }

    async fn list_active(&self) -> StoreResult<Vec<String>> {
        Ok(self.areas()?.active.keys().cloned().collect())
    }

    async fn list_archived(&self) -> StoreResult<Vec<String>> {
        Ok(self.areas()?.archived.keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// FailingJobStore
// ---------------------------------------------------------------------------

/// Wraps a `MemoryJobStore` and fails every mutation of the configured names
/// with a backend error. Reads fail only for names set with
/// `failing_read_on`, listings only when `failing_listing` is set.
#[derive(Debug, Default)]
pub struct FailingJobStore {
    inner: MemoryJobStore,
    failing: BTreeSet<String>,
    failing_reads: BTreeSet<String>,
    fail_listing: bool,
}

impl FailingJobStore {
    pub fn new(inner: MemoryJobStore) -> Self {
        Self {
            inner,
            failing: BTreeSet::new(),
            failing_reads: BTreeSet::new(),
            fail_listing: false,
        }
    }

    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    pub fn failing_read_on(mut self, name: impl Into<String>) -> Self {
        self.failing_reads.insert(name.into());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn inner(&self) -> &MemoryJobStore {
        &self.inner
    }

    fn check(&self, name: &str) -> StoreResult<()> {
        if self.failing.contains(name) {
            return Err(StoreError::Backend(format!("injected failure for {name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for FailingJobStore {
    async fn exists(&self, name: &str) -> StoreResult<bool> {
        self.inner.exists(name).await
    }

    async fn read(&self, name: &str) -> StoreResult<JobRecord> {
        if self.failing_reads.contains(name) {
            return Err(StoreError::Backend(format!("injected read failure for {name}")));
        }
        self.inner.read(name).await
    }

    async fn create(&self, name: &str, definition: &str) -> StoreResult<()> {
        self.check(name)?;
        self.inner.create(name, definition).await
    }

    async fn update(&self, name: &str, definition: &str) -> StoreResult<()> {
        self.check(name)?;
        self.inner.update(name, definition).await
    }

    async fn archive(&self, name: &str) -> StoreResult<()> {
        self.check(name)?;
        self.inner.archive(name).await
    }

    async fn revive(&self, name: &str, definition: &str) -> StoreResult<()> {
        self.check(name)?;
        self.inner.revive(name, definition).await
    }

    async fn list_active(&self) -> StoreResult<Vec<String>> {
        if self.fail_listing {
            return Err(StoreError::Backend("injected listing failure".to_string()));
        }
        self.inner.list_active().await
    }

    async fn list_archived(&self) -> StoreResult<Vec<String>> {
        if self.fail_listing {
            return Err(StoreError::Backend("injected listing failure".to_string()));
        }
        self.inner.list_archived().await
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier that records every call, optionally failing all of them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(NotifyAction, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails after being recorded.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(NotifyAction, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SchedulerNotifier for RecordingNotifier {
    async fn notify(&self, action: NotifyAction, job_name: &str) -> StoreResult<()> {
        self.calls
            .lock()
            .map_err(poisoned)?
            .push((action, job_name.to_string()));
        if self.fail {
            return Err(StoreError::Notify(format!(
                "scheduler unreachable while {action} {job_name}"
            )));
        }
        Ok(())
    }
}
