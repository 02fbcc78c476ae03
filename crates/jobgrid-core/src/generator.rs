//! Derivation of resolved jobs from project configuration trees.

use std::collections::{BTreeMap, HashSet};

use crate::config::ConfigCache;
use crate::domain::{
    BuildJob, ConfigurationError, Job, JobGridError, Platform, Project, PullJob, ReconcileError,
    TaskKind, TestJob, TestPlatformConfig, Variants,
};

/// Turns one project into its jobs.
pub trait JobGenerator: Send + Sync {
    fn project_jobs(
        &self,
        cache: &ConfigCache,
        project: &Project,
    ) -> Result<Vec<Job>, ConfigurationError>;
}

/// Walks a project's configuration tree.
///
/// A `JdkProject` yields its pull job, one build job per build-variant map,
/// and one test job per test-variant map under it (an empty list of maps
/// means one job with default values). A `JdkTestProject` yields only test
/// jobs, whose build side has no provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigTreeGenerator;

impl JobGenerator for ConfigTreeGenerator {
    fn project_jobs(
        &self,
        cache: &ConfigCache,
        project: &Project,
    ) -> Result<Vec<Job>, ConfigurationError> {
        let referenced_by = format!("project {}", project.id());
        let mut jobs = Vec::new();

        if let Project::JdkProject(p) = project {
            jobs.push(Job::Pull(PullJob {
                project_id: p.id.clone(),
                product: p.product.clone(),
                repo_url: p.url.clone(),
            }));
        }

        for build_platform in project.build_platforms() {
            let platform = lookup_platform(cache, &build_platform.platform, &referenced_by)?;
            let build_provider = match (project, &build_platform.provider) {
                (Project::JdkProject(_), None) => {
                    return Err(ConfigurationError::MissingProvider {
                        project: project.id().to_string(),
                        platform: build_platform.platform.clone(),
                    })
                }
                (Project::JdkProject(_), Some(provider)) => Some(provider.clone()),
                (Project::JdkTestProject(_), _) => None,
            };

            for build in &build_platform.variants {
                let build_variants =
                    cache.complete_variants(&build.variants, TaskKind::Build, &referenced_by)?;

                if let Some(provider) = &build_provider {
                    jobs.push(Job::Build(BuildJob {
                        project_id: project.id().to_string(),
                        product: project.product().clone(),
                        platform: platform.clone(),
                        provider: provider.clone(),
                        variants: build_variants.clone(),
                    }));
                }

                for test_platform in &build.test_platforms {
                    let side = BuildSide {
                        platform,
                        provider: build_provider.as_deref(),
                        variants: &build_variants,
                    };
                    jobs.extend(test_jobs(cache, project, &side, test_platform, &referenced_by)?);
                }
            }
        }

        tracing::debug!(project = %project.id(), jobs = jobs.len(), "generated project jobs");
        Ok(jobs)
    }
}

struct BuildSide<'a> {
    platform: &'a Platform,
    provider: Option<&'a str>,
    variants: &'a Variants,
}

fn test_jobs(
    cache: &ConfigCache,
    project: &Project,
    build: &BuildSide<'_>,
    test_platform: &TestPlatformConfig,
    referenced_by: &str,
) -> Result<Vec<Job>, ConfigurationError> {
    let platform = lookup_platform(cache, &test_platform.platform, referenced_by)?;
    let defaults: [BTreeMap<String, String>; 1] = [BTreeMap::new()];
    let mut jobs = Vec::new();

    for task_config in &test_platform.tasks {
        let task = cache
            .task(&task_config.task)
            .ok_or_else(|| ConfigurationError::UnknownTask {
                referenced_by: referenced_by.to_string(),
                task: task_config.task.clone(),
            })?;
        let maps: &[BTreeMap<String, String>] = if task_config.variants.is_empty() {
            &defaults
        } else {
            &task_config.variants
        };
        for map in maps {
            jobs.push(Job::Test(TestJob {
                project_id: project.id().to_string(),
                product: project.product().clone(),
                task: task.clone(),
                platform: platform.clone(),
                provider: test_platform.provider.clone(),
                variants: cache.complete_variants(map, TaskKind::Test, referenced_by)?,
                build_platform: build.platform.clone(),
                build_provider: build.provider.map(str::to_string),
                build_variants: build.variants.clone(),
            }));
        }
    }
    Ok(jobs)
}

fn lookup_platform<'c>(
    cache: &'c ConfigCache,
    id: &str,
    referenced_by: &str,
) -> Result<&'c Platform, ConfigurationError> {
    cache
        .platform(id)
        .ok_or_else(|| ConfigurationError::UnknownPlatform {
            referenced_by: referenced_by.to_string(),
            platform: id.to_string(),
        })
}

/// Jobs of every project, in project order. Two jobs with one name are a
/// hard error; they are never merged.
pub fn generate_all(
    generator: &dyn JobGenerator,
    cache: &ConfigCache,
) -> Result<Vec<Job>, JobGridError> {
    let mut jobs = Vec::new();
    for project in cache.projects() {
        jobs.extend(generator.project_jobs(cache, project)?);
    }
    ensure_unique_names(&jobs)?;
    Ok(jobs)
}

/// First duplicated job name, as an error.
pub fn ensure_unique_names(jobs: &[Job]) -> Result<(), ReconcileError> {
    let mut seen = HashSet::new();
    for job in jobs {
        let name = job.name();
        if !seen.insert(name.clone()) {
            return Err(ReconcileError::DuplicateJobName { name });
        }
    }
    Ok(())
}
