//! Axis model: points of the job space.
//!
//! A spec names a platform, an optional provider, a variant combination and
//! either a project (`BuildSpec`) or a task (`TestSpec`). Its
//! `EqualityFilter` decides which of those axes take part in identity and in
//! matching against jobs.

pub mod filter;
pub mod key;

use serde::Serialize;

use crate::domain::{Job, Platform, Product, Task, TaskKind, Variants};

pub use filter::{EqualityFilter, VariantMask};
pub use key::{render_canonical, KeyPart, SpecKey};

/// Axes shared by build and test specs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecAxes {
    pub platform: Platform,
    /// `None` for a platform without providers.
    pub provider: Option<String>,
    pub variants: Variants,
    pub filter: EqualityFilter,
}

impl SpecAxes {
    fn key(&self, kind: TaskKind, subject: KeyPart) -> SpecKey {
        let f = &self.filter;
        SpecKey {
            kind,
            os: KeyPart::masked(f.os, &self.platform.os),
            version: KeyPart::masked(f.version, &self.platform.version),
            arch: KeyPart::masked(f.arch, &self.platform.architecture),
            provider: match (&self.provider, f.provider) {
                (_, false) => KeyPart::Any,
                (None, true) => KeyPart::Absent,
                (Some(p), true) => KeyPart::Is(p.clone()),
            },
            subject,
            variants: f.variants.apply(&self.variants),
        }
    }

    fn matches_platform(&self, platform: &Platform) -> bool {
        let f = &self.filter;
        (!f.os || self.platform.os == platform.os)
            && (!f.version || self.platform.version == platform.version)
            && (!f.arch || self.platform.architecture == platform.architecture)
    }

    /// Providers are compared only when both sides have one.
    fn matches_provider(&self, provider: Option<&str>) -> bool {
        match (self.filter.provider, self.provider.as_deref(), provider) {
            (true, Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        }
    }

    fn matches_variants(&self, variants: &Variants) -> bool {
        let mask = &self.filter.variants;
        mask.apply(&self.variants) == mask.apply(variants)
    }

    fn matches_side(&self, platform: &Platform, provider: Option<&str>, variants: &Variants) -> bool {
        self.matches_platform(platform)
            && self.matches_provider(provider)
            && self.matches_variants(variants)
    }
}

/// A point of the job space.
pub trait Spec {
    fn kind(&self) -> TaskKind;

    fn axes(&self) -> &SpecAxes;

    /// Structural identity under the spec's filter.
    fn key(&self) -> SpecKey;

    /// Whether `job` lies on this spec.
    fn matches_job(&self, job: &Job) -> bool;

    fn canonical(&self) -> String {
        let axes = self.axes();
        render_canonical(&self.key(), &axes.variants, &axes.filter.variants)
    }
}

/// Platform × provider × project × build-variant combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSpec {
    #[serde(flatten)]
    pub axes: SpecAxes,
    pub project_id: String,
    pub product: Product,
}

impl BuildSpec {
    fn matches_project(&self, project_id: &str, product: &Product) -> bool {
        let f = &self.axes.filter;
        if f.id {
            self.project_id == project_id
        } else if f.jdk {
            self.product.jdk == product.jdk
        } else {
            true
        }
    }
}

impl Spec for BuildSpec {
    fn kind(&self) -> TaskKind {
        TaskKind::Build
    }

    fn axes(&self) -> &SpecAxes {
        &self.axes
    }

    fn key(&self) -> SpecKey {
        let f = &self.axes.filter;
        let subject = if f.id {
            KeyPart::Is(self.project_id.clone())
        } else if f.jdk {
            KeyPart::Is(self.product.jdk.clone())
        } else {
            KeyPart::Any
        };
        self.axes.key(TaskKind::Build, subject)
    }

    /// Build jobs match on their own axes; test jobs on their build side.
    fn matches_job(&self, job: &Job) -> bool {
        match job {
            Job::Pull(_) => false,
            Job::Build(b) => {
                self.matches_project(&b.project_id, &b.product)
                    && self
                        .axes
                        .matches_side(&b.platform, Some(b.provider.as_str()), &b.variants)
            }
            Job::Test(t) => {
                self.matches_project(&t.project_id, &t.product)
                    && self.axes.matches_side(
                        &t.build_platform,
                        t.build_provider.as_deref(),
                        &t.build_variants,
                    )
            }
        }
    }
}

/// Platform × provider × task × test-variant combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSpec {
    #[serde(flatten)]
    pub axes: SpecAxes,
    pub task: Task,
}

impl TestSpec {
    pub fn is_build_task(&self) -> bool {
        self.task.is_build_task()
    }

    fn matches_task(&self, task: &Task) -> bool {
        !self.axes.filter.id || self.task.id == task.id
    }
}

impl Spec for TestSpec {
    fn kind(&self) -> TaskKind {
        TaskKind::Test
    }

    fn axes(&self) -> &SpecAxes {
        &self.axes
    }

    fn key(&self) -> SpecKey {
        let subject = KeyPart::masked(self.axes.filter.id, &self.task.id);
        self.axes.key(TaskKind::Test, subject)
    }

    /// Test jobs match on their own axes. The build task spec stands for
    /// the build jobs on its platform; their build variants are not
    /// compared.
    fn matches_job(&self, job: &Job) -> bool {
        match job {
            Job::Pull(_) => false,
            Job::Build(b) => {
                self.is_build_task()
                    && self.axes.matches_platform(&b.platform)
                    && self.axes.matches_provider(Some(b.provider.as_str()))
            }
            Job::Test(t) => {
                !self.is_build_task()
                    && self.matches_task(&t.task)
                    && self
                        .axes
                        .matches_side(&t.platform, Some(t.provider.as_str()), &t.variants)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildJob, TestJob, TestStability, VariantChoice};
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

    fn product(jdk: &str) -> Product {
        Product {
            jdk: jdk.to_string(),
            package_name: format!("java-{jdk}"),
        }
    }

    fn build_spec(project: &str, filter: EqualityFilter) -> BuildSpec {
        BuildSpec {
            axes: SpecAxes {
                platform: platform("el", "7"),
                provider: Some("vagrant".to_string()),
                variants: variants(&[("debugMode", "release")]),
                filter,
            },
            project_id: project.to_string(),
            product: product("jdk8"),
        }
    }

    fn test_spec(task: &str, provider: Option<&str>) -> TestSpec {
        TestSpec {
            axes: SpecAxes {
                platform: platform("f", "29"),
                provider: provider.map(str::to_string),
                variants: if task == "build" {
                    Variants::empty()
                } else {
                    variants(&[("garbageCollector", "shenandoah")])
                },
                filter: EqualityFilter::exact(),
            },
            task: Task {
                id: task.to_string(),
                kind: if task == "build" {
                    TaskKind::Build
                } else {
                    TaskKind::Test
                },
                ..Task::build()
            },
        }
    }

    fn build_job(project: &str, os: &str, version: &str) -> Job {
        Job::Build(BuildJob {
            project_id: project.to_string(),
            product: product("jdk8"),
            platform: platform(os, version),
            provider: "vagrant".to_string(),
            variants: variants(&[("debugMode", "release")]),
        })
    }

    fn test_job() -> Job {
        Job::Test(TestJob {
            project_id: "ojdk8".to_string(),
            product: product("jdk8"),
            task: test_spec("tck", None).task,
            platform: platform("f", "29"),
            provider: "beaker".to_string(),
            variants: variants(&[("garbageCollector", "shenandoah")]),
            build_platform: platform("el", "7"),
            build_provider: Some("vagrant".to_string()),
            build_variants: variants(&[("debugMode", "release")]),
        })
    }

    #[test]
    fn canonical_string_reflects_filter() {
        let spec = build_spec("ojdk8", EqualityFilter::exact());
        assert_eq!(spec.canonical(), "el7.x86_64-vagrant-ojdk8-release");

        let spec = build_spec("ojdk8", EqualityFilter::exact().by_jdk().without_provider());
        assert_eq!(spec.canonical(), "el7.x86_64-?-jdk8-release");
    }

    #[test]
    fn masked_axes_make_keys_equal() {
        let filter = EqualityFilter::exact().by_jdk();
        let a = build_spec("ojdk8", filter.clone());
        let b = build_spec("ojdk8-shenandoah", filter);
        assert_eq!(a.key(), b.key());

        let a = build_spec("ojdk8", EqualityFilter::exact());
        let b = build_spec("ojdk8-shenandoah", EqualityFilter::exact());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn build_spec_matches_build_job_and_test_build_side() {
        let spec = build_spec("ojdk8", EqualityFilter::exact());
        assert!(spec.matches_job(&build_job("ojdk8", "el", "7")));
        assert!(!spec.matches_job(&build_job("ojdk8", "f", "29")));
        assert!(!spec.matches_job(&build_job("other", "el", "7")));
        assert!(spec.matches_job(&test_job()));
    }

    #[test]
    fn test_spec_matches_own_side() {
        assert!(test_spec("tck", Some("beaker")).matches_job(&test_job()));
        assert!(!test_spec("tck", Some("vagrant")).matches_job(&test_job()));
        // Provider is skipped when the spec has none.
        assert!(test_spec("tck", None).matches_job(&test_job()));
        assert!(!test_spec("jtreg", None).matches_job(&test_job()));
    }

    #[test]
    fn build_task_spec_matches_build_jobs_only() {
        let spec = test_spec("build", Some("vagrant"));
        assert!(spec.matches_job(&build_job("ojdk8", "f", "29")));
        assert!(!spec.matches_job(&build_job("ojdk8", "el", "7")));
        assert!(!spec.matches_job(&test_job()));
    }

    #[test]
    fn variant_sets_must_be_equal() {
        let mut spec = build_spec("ojdk8", EqualityFilter::exact());
        spec.axes.variants = variants(&[("debugMode", "release"), ("jvm", "hotspot")]);
        assert!(!spec.matches_job(&build_job("ojdk8", "el", "7")));

        spec.axes.filter = EqualityFilter::exact().with_variants(["debugMode"]);
        assert!(spec.matches_job(&build_job("ojdk8", "el", "7")));
    }
}
