//! Platform bump: move jobs from one platform to another.

use regex::Regex;

use crate::domain::{BuildJob, Platform, PullJob, TestJob};
use crate::modify::{name_filter_admits, BumpScope, JobModifier};

#[derive(Debug, Clone)]
pub struct PlatformBumper {
    pub from: Platform,
    pub to: Platform,
    pub scope: BumpScope,
    /// Only jobs whose current name matches are bumped.
    pub filter: Option<Regex>,
}

impl PlatformBumper {
    pub fn new(from: Platform, to: Platform, scope: BumpScope) -> Self {
        Self {
            from,
            to,
            scope,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Regex) -> Self {
        self.filter = Some(filter);
        self
    }

    fn is_from(&self, platform: &Platform) -> bool {
        platform.id() == self.from.id()
    }

    fn bump_test_side(&self, job: &TestJob) -> bool {
        self.scope.touches_test_side() && self.is_from(&job.platform)
    }

    fn bump_build_side(&self, job: &TestJob) -> bool {
        self.scope.touches_test_build_side() && self.is_from(&job.build_platform)
    }
}

impl JobModifier for PlatformBumper {
    fn describe(&self) -> String {
        format!(
            "platform {} -> {} ({:?})",
            self.from.id(),
            self.to.id(),
            self.scope
        )
    }

    fn should_modify_pull(&self, _job: &PullJob) -> bool {
        false
    }

    fn should_modify_build(&self, job: &BuildJob) -> bool {
        self.scope.touches_builds()
            && self.is_from(&job.platform)
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
            platform: self.to.clone(),
            ..job.clone()
        }
    }

    fn modify_test(&self, job: &TestJob) -> TestJob {
        let mut bumped = job.clone();
        if self.bump_test_side(job) {
            bumped.platform = self.to.clone();
        }
        if self.bump_build_side(job) {
            bumped.build_platform = self.to.clone();
        }
        bumped
    }
}
