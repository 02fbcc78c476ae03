//! Job modifiers: rewriting one configuration axis across a job set.
//!
//! A `JobModifier` supplies a predicate and a transform for every job kind.
//! All six methods are required, so adding a job kind forces every modifier
//! to decide what it does with it. `modify_job` dispatches on the kind and
//! only transforms jobs the predicate accepts.

pub mod collision;
pub mod platform;
pub mod product;
pub mod provider;
pub mod variant;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{BuildJob, Job, PullJob, TestJob};

pub use collision::{bump, BumpOutcome, CollisionPolicy};
pub use platform::PlatformBumper;
pub use product::ProductBumper;
pub use provider::ProviderBumper;
pub use variant::VariantRemover;

pub trait JobModifier {
    /// Short description for logs and reports.
    fn describe(&self) -> String;

    fn should_modify_pull(&self, job: &PullJob) -> bool;
    fn should_modify_build(&self, job: &BuildJob) -> bool;
    fn should_modify_test(&self, job: &TestJob) -> bool;

    fn modify_pull(&self, job: &PullJob) -> PullJob;
    fn modify_build(&self, job: &BuildJob) -> BuildJob;
    fn modify_test(&self, job: &TestJob) -> TestJob;
}

/// A job and, when the modifier applied to it, its transformed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    pub original: Job,
    pub modified: Option<Job>,
}

impl Modification {
    /// The job as it stands after the modification.
    pub fn result(&self) -> &Job {
        self.modified.as_ref().unwrap_or(&self.original)
    }

    /// `(old, new)` names when the modification renames the job.
    pub fn rename(&self) -> Option<(String, String)> {
        let modified = self.modified.as_ref()?;
        let (old, new) = (self.original.name(), modified.name());
        (old != new).then_some((old, new))
    }
}

pub fn modify_job(modifier: &dyn JobModifier, job: &Job) -> Modification {
    let modified = match job {
        Job::Pull(j) => modifier
            .should_modify_pull(j)
            .then(|| Job::Pull(modifier.modify_pull(j))),
        Job::Build(j) => modifier
            .should_modify_build(j)
            .then(|| Job::Build(modifier.modify_build(j))),
        Job::Test(j) => modifier
            .should_modify_test(j)
            .then(|| Job::Test(modifier.modify_test(j))),
    };
    Modification {
        original: job.clone(),
        modified,
    }
}

pub fn modify_all(modifier: &dyn JobModifier, jobs: &[Job]) -> Vec<Modification> {
    jobs.iter().map(|job| modify_job(modifier, job)).collect()
}

/// Which side of a job a platform or provider bump rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BumpScope {
    /// Build jobs, plus both sides of test jobs.
    #[default]
    Both,
    /// Build jobs only.
    BuildOnly,
    /// The test side of test jobs only.
    TestOnly,
}

impl BumpScope {
    pub fn touches_builds(&self) -> bool {
        matches!(self, BumpScope::Both | BumpScope::BuildOnly)
    }

    pub fn touches_test_side(&self) -> bool {
        matches!(self, BumpScope::Both | BumpScope::TestOnly)
    }

    /// Whether the build side of test jobs is rewritten.
    pub fn touches_test_build_side(&self) -> bool {
        matches!(self, BumpScope::Both)
    }
}

fn name_filter_admits(filter: Option<&Regex>, name: &str) -> bool {
    filter.map_or(true, |regex| regex.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;

    struct RenameProject;

    impl JobModifier for RenameProject {
        fn describe(&self) -> String {
            "rename project".to_string()
        }
        fn should_modify_pull(&self, job: &PullJob) -> bool {
            job.project_id == "a"
        }
        fn should_modify_build(&self, _: &BuildJob) -> bool {
            false
        }
        fn should_modify_test(&self, _: &TestJob) -> bool {
            false
        }
        fn modify_pull(&self, job: &PullJob) -> PullJob {
            PullJob {
                project_id: "b".to_string(),
                ..job.clone()
            }
        }
        fn modify_build(&self, job: &BuildJob) -> BuildJob {
            job.clone()
        }
        fn modify_test(&self, job: &TestJob) -> TestJob {
            job.clone()
        }
    }

    fn pull(project: &str) -> Job {
        Job::Pull(PullJob {
            project_id: project.to_string(),
            product: Product {
                jdk: "jdk8".to_string(),
                package_name: "java-1.8.0-openjdk".to_string(),
            },
            repo_url: String::new(),
        })
    }

    #[test]
    fn predicate_gates_transform() {
        let mods = modify_all(&RenameProject, &[pull("a"), pull("c")]);
        assert_eq!(
            mods[0].rename(),
            Some(("pull-jdk8-a".to_string(), "pull-jdk8-b".to_string()))
        );
        assert!(mods[1].modified.is_none());
        assert_eq!(mods[1].result().name(), "pull-jdk8-c");
    }

    #[test]
    fn scope_sides() {
        assert!(BumpScope::BuildOnly.touches_builds());
        assert!(!BumpScope::BuildOnly.touches_test_side());
        assert!(!BumpScope::BuildOnly.touches_test_build_side());
        assert!(!BumpScope::TestOnly.touches_builds());
        assert!(BumpScope::TestOnly.touches_test_side());
        assert!(BumpScope::Both.touches_test_build_side());
    }
}
