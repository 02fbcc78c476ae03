//! Bumping a job set with naming-collision detection.
//!
//! A rename collides when its new name is also the final name of another job
//! in the resulting set. Rejecting one rename can expose a new collision (the
//! job keeps its old name, which someone else may have been renamed onto), so
//! rejection repeats until no final name is shared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Collision, CollisionError, Job};
use crate::modify::{modify_all, JobModifier, Modification};
use crate::obs;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Any collision aborts the whole bump; nothing is applied.
    #[default]
    Stop,
    /// Apply every non-colliding rename; colliding jobs stay unchanged.
    KeepBumped,
}

/// Result of a bump that was not aborted.
#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    /// Modifications that were applied.
    pub applied: Vec<Modification>,
    /// Renames rejected because their new name was taken.
    pub collisions: Vec<Collision>,
    /// The job set after the bump, in input order.
    pub jobs: Vec<Job>,
}

impl BumpOutcome {
    /// The bumped set, ready to hand to the reconciler.
    pub fn desired_jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }
}

/// Apply `modifier` to `jobs` under `policy`.
pub fn bump(
    modifier: &dyn JobModifier,
    jobs: &[Job],
    policy: CollisionPolicy,
) -> Result<BumpOutcome, CollisionError> {
    let modifications = modify_all(modifier, jobs);
    let renames: Vec<Option<(String, String)>> =
        modifications.iter().map(Modification::rename).collect();
    let mut accepted: Vec<bool> = modifications.iter().map(|m| m.modified.is_some()).collect();
    let mut collisions = Vec::new();

    loop {
        let mut holders: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, m) in modifications.iter().enumerate() {
            let name = match (&renames[i], accepted[i]) {
                (Some((_, new)), true) => new.clone(),
                _ => m.original.name(),
            };
            holders.entry(name).or_default().push(i);
        }

        let mut rejected_any = false;
        for (name, members) in holders.iter().filter(|(_, members)| members.len() > 1) {
            for &i in members {
                let Some((old, _)) = renames[i].as_ref().filter(|_| accepted[i]) else {
                    continue;
                };
                accepted[i] = false;
                rejected_any = true;
                let mut conflicts_with: Vec<String> = members
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| modifications[j].original.name())
                    .collect();
                conflicts_with.sort();
                obs::emit_bump_collision(old, name);
                collisions.push(Collision {
                    original: old.clone(),
                    bumped: name.clone(),
                    conflicts_with,
                });
            }
        }
        if !rejected_any {
            break;
        }
    }

    obs::emit_bump_finished(
        &modifier.describe(),
        accepted.iter().filter(|&&a| a).count(),
        collisions.len(),
    );

    if policy == CollisionPolicy::Stop && !collisions.is_empty() {
        return Err(CollisionError { collisions });
    }

    let jobs = modifications
        .iter()
        .zip(&accepted)
        .map(|(m, &ok)| {
            if ok {
                m.result().clone()
            } else {
                m.original.clone()
            }
        })
        .collect();
    let applied = modifications
        .into_iter()
        .zip(accepted)
        .filter_map(|(m, ok)| ok.then_some(m))
        .collect();

    Ok(BumpOutcome {
        applied,
        collisions,
        jobs,
    })
}
