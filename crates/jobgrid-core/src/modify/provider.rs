//! Provider bump: move jobs from one build provider to another.

use regex::Regex;

use crate::domain::{BuildJob, PullJob, TestJob};
use crate::modify::{name_filter_admits, BumpScope, JobModifier};

#[derive(Debug, Clone)]
pub struct ProviderBumper {
    pub from: String,
    pub to: String,
    pub scope: BumpScope,
    pub filter: Option<Regex>,
}

impl ProviderBumper {
    pub fn new(from: impl Into<String>, to: impl Into<String>, scope: BumpScope) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            scope,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Regex) -> Self {
        self.filter = Some(filter);
        self
    }

    fn bump_test_side(&self, job: &TestJob) -> bool {
        self.scope.touches_test_side() && job.provider == self.from
    }

    /// Test-project jobs have no build provider and are never touched here.
    fn bump_build_side(&self, job: &TestJob) -> bool {
        self.scope.touches_test_build_side()
            && job.build_provider.as_deref() == Some(self.from.as_str())
    }
}

impl JobModifier for ProviderBumper {
    fn describe(&self) -> String {
        format!("provider {} -> {} ({:?})", self.from, self.to, self.scope)
    }

    fn should_modify_pull(&self, _job: &PullJob) -> bool {
        false
    }

    fn should_modify_build(&self, job: &BuildJob) -> bool {
        self.scope.touches_builds()
            && job.provider == self.from
            && name_filter_admits(self.filter.as_ref(), &job.name())
    }

    fn should_modify_test(&self, job: &TestJob) -> bool {
        (self.bump_test_side(job) || self.bump_build_side(job))
            && name_filter_admits(self.filter.as_ref(), &job.name())
    }

    fn modify_pull(&self, job: &PullJob) -> PullJob {
        job.clone()
    }

    fn modify_build(&self, job: &BuildJob) -> BuildJob {
        BuildJob {
            provider: self.to.clone(),
            ..job.clone()
        }
    }

    fn modify_test(&self, job: &TestJob) -> TestJob {
        let mut bumped = job.clone();
        if self.bump_test_side(job) {
            bumped.provider = self.to.clone();
        }
        if self.bump_build_side(job) {
            bumped.build_provider = Some(self.to.clone());
        }
        bumped
    }
}
