//! Product bump: retarget every job of one product at another.

use crate::domain::{BuildJob, Product, PullJob, TestJob};
use crate::modify::JobModifier;

#[derive(Debug, Clone)]
pub struct ProductBumper {
    pub from: Product,
    pub to: Product,
}

impl ProductBumper {
    pub fn new(from: Product, to: Product) -> Self {
        Self { from, to }
    }
}

impl JobModifier for ProductBumper {
    fn describe(&self) -> String {
        format!("product {} -> {}", self.from, self.to)
    }

    fn should_modify_pull(&self, job: &PullJob) -> bool {
        job.product == self.from
    }

    fn should_modify_build(&self, job: &BuildJob) -> bool {
        job.product == self.from
    }

    fn should_modify_test(&self, job: &TestJob) -> bool {
        job.product == self.from
    }

    fn modify_pull(&self, job: &PullJob) -> PullJob {
        PullJob {
            product: self.to.clone(),
            ..job.clone()
        }
    }

    fn modify_build(&self, job: &BuildJob) -> BuildJob {
        BuildJob {
            product: self.to.clone(),
            ..job.clone()
        }
    }

    fn modify_test(&self, job: &TestJob) -> TestJob {
        TestJob {
            product: self.to.clone(),
            ..job.clone()
        }
    }
}
