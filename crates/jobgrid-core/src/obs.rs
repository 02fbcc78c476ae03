//! Structured lifecycle events for jobgrid runs.
//!
//! Every event carries an `event` field naming it, so log pipelines can
//! filter on it regardless of message text. Set `JOBGRID_LOG` to tune
//! verbosity.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped span; everything logged while it is
/// alive carries the `run_id`.
///
/// ```ignore
/// let _span = RunSpan::enter(&ctx.run_id.to_string());
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("jobgrid.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: specs enumerated, with how many candidates survived.
pub fn emit_enumerated(kind: &str, candidates: usize, excluded: usize, kept: usize) {
    info!(
        event = "specs.enumerated",
        kind = %kind,
        candidates = candidates,
        excluded = excluded,
        kept = kept,
    );
}

/// Emit event: matrix built.
pub fn emit_matrix_built(rows: usize, columns: usize, leaves: usize, pruned: bool) {
    info!(
        event = "matrix.built",
        rows = rows,
        columns = columns,
        leaves = leaves,
        pruned = pruned,
    );
}

/// Emit event: reconciliation planned and about to be applied.
pub fn emit_reconcile_started(run_id: &str, desired: usize, planned: usize, dry_run: bool) {
    info!(
        event = "reconcile.started",
        run_id = %run_id,
        desired = desired,
        planned = planned,
        dry_run = dry_run,
    );
}

/// Emit event: one reconcile action applied (or failed).
pub fn emit_job_action(job_name: &str, action: &str, success: bool) {
    if success {
        info!(event = "reconcile.job_action", job = %job_name, action = %action, success = true);
    } else {
        warn!(event = "reconcile.job_action", job = %job_name, action = %action, success = false);
    }
}

/// Emit event: reconciliation finished.
pub fn emit_reconcile_finished(run_id: &str, succeeded: usize, failed: usize, unchanged: usize) {
    info!(
        event = "reconcile.finished",
        run_id = %run_id,
        succeeded = succeeded,
        failed = failed,
        unchanged = unchanged,
    );
}

/// Emit event: the scheduler notifier failed (warning level, never fatal).
pub fn emit_notify_failed(job_name: &str, action: &str, error: &dyn std::fmt::Display) {
    warn!(event = "notify.failed", job = %job_name, action = %action, error = %error);
}

/// Emit event: a bump would rename a job onto a taken name.
pub fn emit_bump_collision(original: &str, bumped: &str) {
    warn!(event = "bump.collision", original = %original, bumped = %bumped);
}

/// Emit event: bump computed.
pub fn emit_bump_finished(modifier: &str, modified: usize, collisions: usize) {
    info!(
        event = "bump.finished",
        modifier = %modifier,
        modified = modified,
        collisions = collisions,
    );
}
