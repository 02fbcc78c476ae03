//! Per-job outcome records of a reconciliation run.

use std::fmt;

use jobgrid_store::NotifyAction;
use serde::{Deserialize, Serialize};

/// What the reconciler does to one job name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    // Declaration order is application order.
    Archive,
    Revive,
    Update,
    Create,
}

impl JobAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobAction::Archive => "archive",
            JobAction::Revive => "revive",
            JobAction::Update => "update",
            JobAction::Create => "create",
        }
    }

    pub fn notify_action(&self) -> NotifyAction {
        match self {
            JobAction::Archive => NotifyAction::Archived,
            JobAction::Revive => NotifyAction::Revived,
            JobAction::Update => NotifyAction::Updated,
            JobAction::Create => NotifyAction::Created,
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one action. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUpdateResult {
    pub job_name: String,
    pub action: JobAction,
    pub success: bool,
    pub message: String,
}

impl JobUpdateResult {
    pub fn succeeded(job_name: impl Into<String>, action: JobAction) -> Self {
        Self {
            job_name: job_name.into(),
            action,
            success: true,
            message: action.notify_action().as_str().to_string(),
        }
    }

    pub fn failed(job_name: impl Into<String>, action: JobAction, message: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            action,
            success: false,
            message: message.into(),
        }
    }
}

/// Append-only collection of outcomes for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobUpdateResults(Vec<JobUpdateResult>);

impl JobUpdateResults {
    pub fn iter(&self) -> impl Iterator<Item = &JobUpdateResult> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &JobUpdateResult> {
        self.0.iter().filter(|r| r.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobUpdateResult> {
        self.0.iter().filter(|r| !r.success)
    }

    pub fn all_succeeded(&self) -> bool {
        self.0.iter().all(|r| r.success)
    }

    /// Outcome for `job_name`, if it was touched.
    pub fn for_job(&self, job_name: &str) -> Option<&JobUpdateResult> {
        self.0.iter().find(|r| r.job_name == job_name)
    }
}

impl FromIterator<JobUpdateResult> for JobUpdateResults {
    fn from_iter<T: IntoIterator<Item = JobUpdateResult>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a JobUpdateResults {
    type Item = &'a JobUpdateResult;
    type IntoIter = std::slice::Iter<'a, JobUpdateResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
