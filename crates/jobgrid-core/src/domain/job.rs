//! Resolved jobs.
//!
//! A job carries fully resolved values (platforms, tasks, variant choices),
//! never axis placeholders. Its name is derived from those values and is the
//! identity the job store keys definitions by.

use serde::{Deserialize, Serialize};

use crate::domain::platform::Platform;
use crate::domain::project::Product;
use crate::domain::task::Task;
use crate::domain::variant::Variants;

/// Pulls project sources; one per building project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullJob {
    pub project_id: String,
    pub product: Product,
    pub repo_url: String,
}

impl PullJob {
    pub fn name(&self) -> String {
        join_name(&["pull", &self.product.jdk, &self.project_id])
    }
}

/// Builds a project on one platform with one build-variant combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildJob {
    pub project_id: String,
    pub product: Product,
    pub platform: Platform,
    pub provider: String,
    pub variants: Variants,
}

impl BuildJob {
    pub fn name(&self) -> String {
        join_name(&[
            "build",
            &self.product.jdk,
            &self.project_id,
            &self.platform.id(),
            &self.provider,
            &self.variants.to_string(),
        ])
    }
}

/// Runs a test task against one build.
///
/// The build side (`build_platform`, `build_provider`, `build_variants`) names
/// a build of the same project. Test-only projects take builds from an
/// artifact store and have no build provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestJob {
    pub project_id: String,
    pub product: Product,
    pub task: Task,
    pub platform: Platform,
    pub provider: String,
    pub variants: Variants,
    pub build_platform: Platform,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_provider: Option<String>,

    pub build_variants: Variants,
}

impl TestJob {
    pub fn name(&self) -> String {
        join_name(&[
            &self.task.id,
            &self.product.jdk,
            &self.project_id,
            &self.build_node(),
            &self.build_variants.to_string(),
            &format!("{}.{}", self.platform.id(), self.provider),
            &self.variants.to_string(),
        ])
    }

    /// `{platform}.{provider}` of the build, or just the platform for
    /// artifact-store builds.
    fn build_node(&self) -> String {
        match &self.build_provider {
            Some(provider) => format!("{}.{}", self.build_platform.id(), provider),
            None => self.build_platform.id(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Pull,
    Build,
    Test,
}

/// Closed set of job kinds. Code dispatching on kind matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    Pull(PullJob),
    Build(BuildJob),
    Test(TestJob),
}

impl Job {
    /// Canonical name; the job-store identity.
    pub fn name(&self) -> String {
        match self {
            Job::Pull(j) => j.name(),
            Job::Build(j) => j.name(),
            Job::Test(j) => j.name(),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Job::Pull(_) => JobKind::Pull,
            Job::Build(_) => JobKind::Build,
            Job::Test(_) => JobKind::Test,
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            Job::Pull(j) => &j.project_id,
            Job::Build(j) => &j.project_id,
            Job::Test(j) => &j.project_id,
        }
    }

    pub fn product(&self) -> &Product {
        match self {
            Job::Pull(j) => &j.product,
            Job::Build(j) => &j.product,
            Job::Test(j) => &j.product,
        }
    }
}

impl From<PullJob> for Job {
    fn from(job: PullJob) -> Self {
        Job::Pull(job)
    }
}

impl From<BuildJob> for Job {
    fn from(job: BuildJob) -> Self {
        Job::Build(job)
    }
}

impl From<TestJob> for Job {
    fn from(job: TestJob) -> Self {
        Job::Test(job)
    }
}

/// Dash-joined, skipping empty parts (a job without variants has no
/// trailing separator).
fn join_name(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::platform::TestStability;
    use crate::domain::variant::{TaskKind, VariantChoice};
    use std::collections::BTreeMap;

    fn platform(os: &str, version: &str) -> Platform {
        Platform {
            os: os.to_string(),
            version: version.to_string(),
            architecture: "x86_64".to_string(),
            alias: None,
            providers: vec![],
            vm_name: String::new(),
            test_stability: TestStability::default(),
            tags: vec![],
            variables: BTreeMap::new(),
        }
    }

    fn product() -> Product {
        Product {
            jdk: "jdk8".to_string(),
            package_name: "java-1.8.0-openjdk".to_string(),
        }
    }

    fn variants(values: &[(&str, &str)]) -> Variants {
        values
            .iter()
            .enumerate()
            .map(|(i, (c, v))| VariantChoice {
                order: i as u32,
                category: c.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    #[test]
    fn pull_job_name() {
        let job = PullJob {
            project_id: "ojdk8".to_string(),
            product: product(),
            repo_url: "https://example.org/jdk8u".to_string(),
        };
        assert_eq!(Job::from(job).name(), "pull-jdk8-ojdk8");
    }

    #[test]
    fn build_job_name() {
        let job = BuildJob {
            project_id: "ojdk8".to_string(),
            product: product(),
            platform: platform("el", "7"),
            provider: "vagrant".to_string(),
            variants: variants(&[("debugMode", "release"), ("jvm", "hotspot")]),
        };
        assert_eq!(job.name(), "build-jdk8-ojdk8-el7.x86_64-vagrant-release.hotspot");
    }

    #[test]
    fn build_job_without_variants_has_no_trailing_dash() {
        let job = BuildJob {
            project_id: "p".to_string(),
            product: product(),
            platform: platform("el", "7"),
            provider: "vagrant".to_string(),
            variants: Variants::empty(),
        };
        assert_eq!(job.name(), "build-jdk8-p-el7.x86_64-vagrant");
    }

    fn tck_job() -> TestJob {
        TestJob {
            project_id: "ojdk8".to_string(),
            product: product(),
            task: Task {
                id: "tck".to_string(),
                kind: TaskKind::Test,
                ..Task::build()
            },
            platform: platform("f", "29"),
            provider: "beaker".to_string(),
            variants: variants(&[("gc", "shenandoah")]),
            build_platform: platform("el", "7"),
            build_provider: Some("vagrant".to_string()),
            build_variants: variants(&[("debugMode", "release")]),
        }
    }

    #[test]
    fn test_job_name() {
        assert_eq!(
            tck_job().name(),
            "tck-jdk8-ojdk8-el7.x86_64.vagrant-release-f29.x86_64.beaker-shenandoah"
        );
    }

    #[test]
    fn test_job_name_without_build_provider() {
        let job = TestJob {
            build_provider: None,
            ..tck_job()
        };
        assert_eq!(
            job.name(),
            "tck-jdk8-ojdk8-el7.x86_64-release-f29.x86_64.beaker-shenandoah"
        );
    }

    #[test]
    fn builds_on_different_providers_give_distinct_test_names() {
        let beaker_build = TestJob {
            build_provider: Some("beaker".to_string()),
            ..tck_job()
        };
        assert_ne!(tck_job().name(), beaker_build.name());
    }
}
