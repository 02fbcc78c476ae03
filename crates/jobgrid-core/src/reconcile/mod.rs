//! Reconciliation of a desired job set against a job store.
//!
//! Planning is pure: `plan_actions` maps the desired definitions and the
//! store's state to an ordered list of actions. Application drives the store
//! with bounded concurrency and records one outcome per action; it never
//! stops at the first failure.

pub mod result;

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{self, StreamExt};
use jobgrid_store::{DefinitionDigest, JobStore, SchedulerNotifier, StoreError};
use serde::Serialize;

use crate::domain::{Job, ReconcileError};
use crate::generator::ensure_unique_names;
use crate::obs;
use crate::render::JobRenderer;

pub use result::{JobAction, JobUpdateResult, JobUpdateResults};

/// Active and archived job names, with the digest of each active definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub active: BTreeMap<String, DefinitionDigest>,
    pub archived: BTreeSet<String>,
    /// Active names whose definition could not be read, with the error.
    pub unreadable: BTreeMap<String, String>,
}

impl StoreState {
    /// Read the whole state of `store`.
    ///
    /// Only a failed listing is an error. A definition that cannot be read
    /// lands in `unreadable` and the job is left alone.
    pub async fn read(store: &dyn JobStore) -> Result<Self, StoreError> {
        let names = store.list_active().await?;
        let archived = store.list_archived().await?.into_iter().collect();

        let mut active = BTreeMap::new();
        let mut unreadable = BTreeMap::new();
        for name in names {
            match store.read(&name).await {
                Ok(record) => {
                    active.insert(name, record.digest);
                }
                Err(e) => {
                    unreadable.insert(name, e.to_string());
                }
            }
        }
        Ok(Self {
            active,
            archived,
            unreadable,
        })
    }
}

/// Active jobs of a store, read back into `Job` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployedJobs {
    /// In store listing order.
    pub jobs: Vec<Job>,
    /// Names that could not be read or parsed, or whose definition names a
    /// different job, with the reason.
    pub unreadable: BTreeMap<String, String>,
}

impl DeployedJobs {
    /// Read every active definition of `store` through `renderer`.
    ///
    /// Only a failed listing is an error.
    pub async fn load(
        store: &dyn JobStore,
        renderer: &dyn JobRenderer,
    ) -> Result<Self, StoreError> {
        let mut deployed = Self::default();
        for name in store.list_active().await? {
            let job = match store.read(&name).await {
                Ok(record) => renderer.parse(&record.definition).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match job {
                Ok(job) if job.name() == name => deployed.jobs.push(job),
                Ok(job) => {
                    let reason = format!("definition describes {}", job.name());
                    deployed.unreadable.insert(name, reason);
                }
                Err(reason) => {
                    deployed.unreadable.insert(name, reason);
                }
            }
        }
        Ok(deployed)
    }
}

/// One planned action. `definition` is set for every action but archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub job_name: String,
    pub action: JobAction,
    #[serde(skip)]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    /// Archives, then revives, then updates, then creates; by name within
    /// each group.
    pub actions: Vec<PlannedAction>,
    /// Desired jobs whose active definition is already identical.
    pub unchanged: Vec<String>,
    /// Active jobs skipped because their definition could not be read.
    pub unreadable: Vec<JobUpdateResult>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.unreadable.is_empty()
    }

    pub fn count(&self, action: JobAction) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }
}

/// Compare desired definitions (by job name) with the store state.
///
/// A name that is both active and archived counts as active. Unreadable
/// names get no action, only a failed outcome for what would have been
/// done to them.
pub fn plan_actions(desired: &BTreeMap<String, String>, state: &StoreState) -> ReconcilePlan {
    let unreadable = state
        .unreadable
        .iter()
        .map(|(name, error)| {
            let action = if desired.contains_key(name) {
                JobAction::Update
            } else {
                JobAction::Archive
            };
            JobUpdateResult::failed(name, action, format!("unreadable: {error}"))
        })
        .collect();

    let archives = state
        .active
        .keys()
        .filter(|name| !desired.contains_key(*name) && !state.unreadable.contains_key(*name))
        .map(|name| PlannedAction {
            job_name: name.clone(),
            action: JobAction::Archive,
            definition: None,
        });

    let mut unchanged = Vec::new();
    let mut others = Vec::new();
    for (name, definition) in desired {
        if state.unreadable.contains_key(name) {
            continue;
        }
        let action = match state.active.get(name) {
            Some(digest) if *digest == DefinitionDigest::of(definition) => {
                unchanged.push(name.clone());
                continue;
            }
            Some(_) => JobAction::Update,
            None if state.archived.contains(name) => JobAction::Revive,
            None => JobAction::Create,
        };
        others.push(PlannedAction {
            job_name: name.clone(),
            action,
            definition: Some(definition.clone()),
        });
    }

    let mut actions: Vec<PlannedAction> = archives.chain(others).collect();
    actions.sort_by(|a, b| (a.action, &a.job_name).cmp(&(b.action, &b.job_name)));
    ReconcilePlan {
        actions,
        unchanged,
        unreadable,
    }
}

/// Plan plus what applying it did. `results` is empty for a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub run_id: String,
    pub dry_run: bool,
    pub plan: ReconcilePlan,
    pub results: JobUpdateResults,
}

/// Drives a `JobStore` towards a desired job set.
pub struct Reconciler<'a> {
    store: &'a dyn JobStore,
    renderer: &'a dyn JobRenderer,
    notifier: Option<&'a dyn SchedulerNotifier>,
    concurrency: usize,
    run_id: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn JobStore, renderer: &'a dyn JobRenderer) -> Self {
        Self {
            store,
            renderer,
            notifier: None,
            concurrency: 1,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_notifier(mut self, notifier: &'a dyn SchedulerNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Maximum actions in flight; at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Render the desired jobs and plan against the current store state.
    ///
    /// Fails before touching the store when two desired jobs share a name,
    /// a job cannot be rendered, or the store cannot be listed.
    pub async fn plan(&self, desired: &[Job]) -> Result<ReconcilePlan, ReconcileError> {
        ensure_unique_names(desired)?;
        let definitions = desired
            .iter()
            .map(|job| -> Result<(String, String), ReconcileError> {
                Ok((job.name(), self.renderer.render(job)?))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        let state = StoreState::read(self.store).await?;
        Ok(plan_actions(&definitions, &state))
    }

    /// Plan and, unless `dry_run`, apply.
    pub async fn reconcile(
        &self,
        desired: &[Job],
        dry_run: bool,
    ) -> Result<ReconcileReport, ReconcileError> {
        let plan = self.plan(desired).await?;
        obs::emit_reconcile_started(&self.run_id, desired.len(), plan.actions.len(), dry_run);

        let results = if dry_run {
            JobUpdateResults::default()
        } else {
            self.apply(&plan).await
        };

        obs::emit_reconcile_finished(
            &self.run_id,
            results.successes().count(),
            results.failures().count(),
            plan.unchanged.len(),
        );
        Ok(ReconcileReport {
            run_id: self.run_id.clone(),
            dry_run,
            plan,
            results,
        })
    }

    /// Apply every planned action. Actions target distinct names, so they
    /// may run concurrently; outcomes come back in plan order, after the
    /// failures recorded for unreadable jobs.
    pub async fn apply(&self, plan: &ReconcilePlan) -> JobUpdateResults {
        for skipped in &plan.unreadable {
            obs::emit_job_action(&skipped.job_name, skipped.action.as_str(), false);
        }
        let applied = stream::iter(&plan.actions)
            .map(|planned| self.apply_one(planned))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        plan.unreadable.iter().cloned().chain(applied).collect()
    }

    async fn apply_one(&self, planned: &PlannedAction) -> JobUpdateResult {
        let name = planned.job_name.as_str();
        let definition = planned.definition.as_deref().unwrap_or_default();

        let outcome = match planned.action {
            JobAction::Archive => self.store.archive(name).await,
            JobAction::Revive => self.store.revive(name, definition).await,
            JobAction::Update => self.store.update(name, definition).await,
            JobAction::Create => self.store.create(name, definition).await,
        };

        let result = match outcome {
            Ok(()) => {
                self.notify(planned.action, name).await;
                JobUpdateResult::succeeded(name, planned.action)
            }
            Err(e) if e.is_conflict() => {
                JobUpdateResult::failed(name, planned.action, format!("conflict: {e}"))
            }
            Err(e) => JobUpdateResult::failed(name, planned.action, e.to_string()),
        };
        obs::emit_job_action(name, planned.action.as_str(), result.success);
        result
    }

    async fn notify(&self, action: JobAction, name: &str) {
        let Some(notifier) = self.notifier else {
            return;
        };
        if let Err(e) = notifier.notify(action.notify_action(), name).await {
            obs::emit_notify_failed(name, action.as_str(), &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(n, d)| (n.to_string(), d.to_string()))
            .collect()
    }

    fn state(active: &[(&str, &str)], archived: &[&str]) -> StoreState {
        StoreState {
            active: active
                .iter()
                .map(|(n, d)| (n.to_string(), DefinitionDigest::of(d)))
                .collect(),
            archived: archived.iter().map(|n| n.to_string()).collect(),
            unreadable: BTreeMap::new(),
        }
    }

    fn summary(plan: &ReconcilePlan) -> Vec<(JobAction, &str)> {
        plan.actions
            .iter()
            .map(|a| (a.action, a.job_name.as_str()))
            .collect()
    }

    #[test]
    fn plans_every_rule_in_order() {
        let plan = plan_actions(
            &desired(&[("new", "1"), ("same", "2"), ("changed", "3"), ("old", "4")]),
            &state(&[("same", "2"), ("changed", "x"), ("gone", "5")], &["old"]),
        );
        assert_eq!(
            summary(&plan),
            vec![
                (JobAction::Archive, "gone"),
                (JobAction::Revive, "old"),
                (JobAction::Update, "changed"),
                (JobAction::Create, "new"),
            ]
        );
        assert_eq!(plan.unchanged, vec!["same".to_string()]);
        assert_eq!(plan.actions[1].definition.as_deref(), Some("4"));
        assert!(plan.actions[0].definition.is_none());
    }

    #[test]
    fn active_wins_over_archived_copy() {
        let plan = plan_actions(
            &desired(&[("both", "1")]),
            &state(&[("both", "1")], &["both"]),
        );
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn unreadable_jobs_are_skipped_with_a_failed_outcome() {
        let mut current = state(&[("ok", "1")], &[]);
        current
            .unreadable
            .insert("legacy".to_string(), "bad bytes".to_string());
        current
            .unreadable
            .insert("wanted".to_string(), "bad bytes".to_string());

        let plan = plan_actions(&desired(&[("wanted", "2"), ("new", "3")]), &current);
        assert_eq!(
            summary(&plan),
            vec![(JobAction::Archive, "ok"), (JobAction::Create, "new")]
        );
        let skipped: Vec<(JobAction, &str, bool)> = plan
            .unreadable
            .iter()
            .map(|r| (r.action, r.job_name.as_str(), r.success))
            .collect();
        assert_eq!(
            skipped,
            vec![
                (JobAction::Archive, "legacy", false),
                (JobAction::Update, "wanted", false)
            ]
        );
        assert!(plan.unreadable[0].message.starts_with("unreadable: "));
    }

    #[test]
    fn empty_desired_archives_everything() {
        let plan = plan_actions(&desired(&[]), &state(&[("a", "1"), ("b", "2")], &[]));
        assert_eq!(plan.count(JobAction::Archive), 2);
    }
}
