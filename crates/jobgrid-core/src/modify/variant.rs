//! Task-variant removal: drop one variant category from every job that has
//! it.
//!
//! A BUILD category is stripped from build jobs and from the build side of
//! test jobs; a TEST category from the test side of test jobs.

use crate::domain::{BuildJob, PullJob, TaskKind, TaskVariant, TestJob};
use crate::modify::JobModifier;

#[derive(Debug, Clone)]
pub struct VariantRemover {
    pub variant: TaskVariant,
}

impl VariantRemover {
    pub fn new(variant: TaskVariant) -> Self {
        Self { variant }
    }

    fn is_build_category(&self) -> bool {
        self.variant.kind == TaskKind::Build
    }

    /// Apply the removal to an archived build-artifact label,
    /// `{buildVariantValues}.{platformId}`.
    ///
    /// `build_categories` are the BUILD variants in axis order, as the label
    /// was written. Returns `None` when the category is not a BUILD one or the
    /// label does not carry a value of it where expected.
    pub fn strip_artifact_label(
        &self,
        label: &str,
        build_categories: &[TaskVariant],
    ) -> Option<String> {
        if !self.is_build_category() {
            return None;
        }
        let position = build_categories
            .iter()
            .position(|v| v.id == self.variant.id)?;

        let parts: Vec<&str> = label.split('.').collect();
        // The platform id itself contains a dot, so it spans two parts.
        if parts.len() < build_categories.len() + 2 {
            return None;
        }
        self.variant.value(parts[position])?;

        let kept: Vec<&str> = parts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, part)| *part)
            .collect();
        Some(kept.join("."))
    }
}

impl JobModifier for VariantRemover {
    fn describe(&self) -> String {
        format!("remove {} variant {}", self.variant.kind, self.variant.id)
    }

    fn should_modify_pull(&self, _job: &PullJob) -> bool {
        false
    }

    fn should_modify_build(&self, job: &BuildJob) -> bool {
        self.is_build_category() && job.variants.contains_category(&self.variant.id)
    }

    fn should_modify_test(&self, job: &TestJob) -> bool {
        if self.is_build_category() {
            job.build_variants.contains_category(&self.variant.id)
        } else {
            job.variants.contains_category(&self.variant.id)
        }
    }

    fn modify_pull(&self, job: &PullJob) -> PullJob {
        job.clone()
    }

    fn modify_build(&self, job: &BuildJob) -> BuildJob {
        BuildJob {
            variants: job.variants.without(&self.variant.id),
            ..job.clone()
        }
    }

    fn modify_test(&self, job: &TestJob) -> TestJob {
        let mut stripped = job.clone();
        if self.is_build_category() {
            stripped.build_variants = job.build_variants.without(&self.variant.id);
        } else {
            stripped.variants = job.variants.without(&self.variant.id);
        }
        stripped
    }
}
