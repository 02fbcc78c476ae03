//! Read-only configuration cache.
//!
//! A `ConfigCache` is built once per run from a `ConfigSnapshot`, validated,
//! and then shared immutably (`Arc`) by the enumerator, matrix builder,
//! generator and bumpers.

pub mod reader;
pub mod settings;

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ConfigurationError, Platform, Project, Provider, Task, TaskKind, TaskVariant, Variants,
};

pub use reader::{ConfigReader, DirConfigReader};
pub use settings::Settings;

/// Raw configuration records, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub task_variants: Vec<TaskVariant>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Validated, id-indexed view over a `ConfigSnapshot`.
#[derive(Debug)]
pub struct ConfigCache {
    platforms: Vec<Platform>,
    providers: Vec<Provider>,
    tasks: Vec<Task>,
    task_variants: Vec<TaskVariant>,
    projects: Vec<Project>,
    platform_index: HashMap<String, usize>,
    provider_index: HashMap<String, usize>,
    task_index: HashMap<String, usize>,
    variant_index: HashMap<String, usize>,
    project_index: HashMap<String, usize>,
    exclusions: HashMap<(String, String), Vec<Regex>>,
}

type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

impl ConfigCache {
    /// Validate a snapshot and index it.
    ///
    /// The synthetic build task is added in front of the task list when the
    /// snapshot does not declare it. Task variants are ordered by
    /// `(order, id)`; everything else keeps declared order.
    pub fn build(snapshot: ConfigSnapshot) -> ConfigResult<Self> {
        let ConfigSnapshot {
            platforms,
            providers,
            mut tasks,
            mut task_variants,
            projects,
        } = snapshot;

        if !tasks.iter().any(Task::is_build_task) {
            tasks.insert(0, Task::build());
        }
        task_variants.sort_by(|a, b| (a.order, &a.id).cmp(&(b.order, &b.id)));

        let provider_index = index("provider", providers.iter().map(|p| p.id.clone()))?;
        let platform_index = index("platform", platforms.iter().map(Platform::id))?;
        let task_index = index("task", tasks.iter().map(|t| t.id.clone()))?;
        let variant_index = index("task variant", task_variants.iter().map(|v| v.id.clone()))?;
        let project_index = index("project", projects.iter().map(|p| p.id().to_string()))?;

        let exclusions = compile_exclusions(&task_variants)?;

        let cache = Self {
            platforms,
            providers,
            tasks,
            task_variants,
            projects,
            platform_index,
            provider_index,
            task_index,
            variant_index,
            project_index,
            exclusions,
        };

        cache.validate_platforms()?;
        cache.validate_task_variants()?;
        for project in &cache.projects {
            cache.validate_project(project)?;
        }

        tracing::debug!(
            platforms = cache.platforms.len(),
            providers = cache.providers.len(),
            tasks = cache.tasks.len(),
            task_variants = cache.task_variants.len(),
            projects = cache.projects.len(),
            "configuration cache built"
        );
        Ok(cache)
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn platform(&self, id: &str) -> Option<&Platform> {
        self.platform_index.get(id).map(|&i| &self.platforms[i])
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.provider_index.get(id).map(|&i| &self.providers[i])
    }

    /// All tasks; the synthetic build task is always present.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }

    /// Task variants in `(order, id)` order.
    pub fn task_variants(&self) -> &[TaskVariant] {
        &self.task_variants
    }

    pub fn task_variant(&self, id: &str) -> Option<&TaskVariant> {
        self.variant_index.get(id).map(|&i| &self.task_variants[i])
    }

    pub fn variants_of_kind(&self, kind: TaskKind) -> impl Iterator<Item = &TaskVariant> {
        self.task_variants.iter().filter(move |v| v.kind == kind)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.project_index.get(id).map(|&i| &self.projects[i])
    }

    /// Whether a combination pairs a value with another value matched by
    /// one of its exclusion patterns.
    pub fn violates_exclusions(&self, variants: &Variants) -> bool {
        variants.iter().any(|choice| {
            let Some(patterns) = self
                .exclusions
                .get(&(choice.category.clone(), choice.value.clone()))
            else {
                return false;
            };
            variants
                .iter()
                .filter(|other| other.category != choice.category)
                .any(|other| patterns.iter().any(|p| p.is_match(&other.value)))
        })
    }

    /// Resolve a declared `category -> value` map into a full combination of
    /// `kind` variants, filling undeclared categories with their defaults.
    pub fn complete_variants(
        &self,
        declared: &BTreeMap<String, String>,
        kind: TaskKind,
        referenced_by: &str,
    ) -> ConfigResult<Variants> {
        self.check_variant_map(declared, kind, referenced_by)?;
        Ok(self
            .variants_of_kind(kind)
            .map(|variant| {
                let value = declared
                    .get(&variant.id)
                    .map(String::as_str)
                    .unwrap_or(variant.default_value.as_str());
                variant.choice(value)
            })
            .collect())
    }

    /// Resolve a declared map as-is, without filling defaults.
    pub fn resolve_variants(
        &self,
        declared: &BTreeMap<String, String>,
        kind: TaskKind,
        referenced_by: &str,
    ) -> ConfigResult<Variants> {
        self.check_variant_map(declared, kind, referenced_by)?;
        Ok(declared
            .iter()
            .filter_map(|(category, value)| self.task_variant(category).map(|v| v.choice(value)))
            .collect())
    }

    fn validate_platforms(&self) -> ConfigResult<()> {
        for platform in &self.platforms {
            for provider in platform.provider_ids() {
                if self.provider(provider).is_none() {
                    return Err(ConfigurationError::UnknownProvider {
                        referenced_by: format!("platform {}", platform.id()),
                        provider: provider.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_task_variants(&self) -> ConfigResult<()> {
        for variant in &self.task_variants {
            // Empty variants are rejected at enumeration time.
            if !variant.values.is_empty() && variant.value(&variant.default_value).is_none() {
                return Err(ConfigurationError::UnknownVariantValue {
                    referenced_by: format!("default of task variant {}", variant.id),
                    category: variant.id.clone(),
                    value: variant.default_value.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_project(&self, project: &Project) -> ConfigResult<()> {
        let project_ref = format!("project {}", project.id());

        for provider in project.build_providers() {
            self.require_provider(provider, &project_ref)?;
        }

        for build_platform in project.build_platforms() {
            self.require_platform(&build_platform.platform, &project_ref)?;

            match (&build_platform.provider, project.is_test_project()) {
                (None, false) => {
                    return Err(ConfigurationError::MissingProvider {
                        project: project.id().to_string(),
                        platform: build_platform.platform.clone(),
                    })
                }
                (Some(provider), true) => {
                    return Err(ConfigurationError::UnexpectedProvider {
                        project: project.id().to_string(),
                        platform: build_platform.platform.clone(),
                        provider: provider.clone(),
                    })
                }
                (Some(provider), false) => self.require_provider(provider, &project_ref)?,
                (None, true) => {}
            }

            for build in &build_platform.variants {
                self.check_variant_map(&build.variants, TaskKind::Build, &project_ref)?;

                for test_platform in &build.test_platforms {
                    self.require_platform(&test_platform.platform, &project_ref)?;
                    self.require_provider(&test_platform.provider, &project_ref)?;

                    for test_task in &test_platform.tasks {
                        let task = self.task(&test_task.task).ok_or_else(|| {
                            ConfigurationError::UnknownTask {
                                referenced_by: project_ref.clone(),
                                task: test_task.task.clone(),
                            }
                        })?;
                        if task.kind != TaskKind::Test {
                            return Err(ConfigurationError::WrongKind {
                                referenced_by: project_ref.clone(),
                                id: task.id.clone(),
                                expected: TaskKind::Test,
                                found: task.kind,
                            });
                        }
                        for map in &test_task.variants {
                            self.check_variant_map(map, TaskKind::Test, &project_ref)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_variant_map(
        &self,
        declared: &BTreeMap<String, String>,
        kind: TaskKind,
        referenced_by: &str,
    ) -> ConfigResult<()> {
        for (category, value) in declared {
            let variant =
                self.task_variant(category)
                    .ok_or_else(|| ConfigurationError::UnknownVariant {
                        referenced_by: referenced_by.to_string(),
                        category: category.clone(),
                    })?;
            if variant.kind != kind {
                return Err(ConfigurationError::WrongKind {
                    referenced_by: referenced_by.to_string(),
                    id: category.clone(),
                    expected: kind,
                    found: variant.kind,
                });
            }
            if variant.value(value).is_none() {
                return Err(ConfigurationError::UnknownVariantValue {
                    referenced_by: referenced_by.to_string(),
                    category: category.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    fn require_platform(&self, id: &str, referenced_by: &str) -> ConfigResult<()> {
        match self.platform(id) {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::UnknownPlatform {
                referenced_by: referenced_by.to_string(),
                platform: id.to_string(),
            }),
        }
    }

    fn require_provider(&self, id: &str, referenced_by: &str) -> ConfigResult<()> {
        match self.provider(id) {
            Some(_) => Ok(()),
            None => Err(ConfigurationError::UnknownProvider {
                referenced_by: referenced_by.to_string(),
                provider: id.to_string(),
            }),
        }
    }
}

fn index(
    kind: &'static str,
    ids: impl Iterator<Item = String>,
) -> ConfigResult<HashMap<String, usize>> {
    let mut map = HashMap::new();
    for (i, id) in ids.enumerate() {
        if map.insert(id.clone(), i).is_some() {
            return Err(ConfigurationError::DuplicateId { kind, id });
        }
    }
    Ok(map)
}

fn compile_exclusions(
    variants: &[TaskVariant],
) -> ConfigResult<HashMap<(String, String), Vec<Regex>>> {
    let mut compiled = HashMap::new();
    for variant in variants {
        let mut seen = HashSet::new();
        for value in &variant.values {
            if !seen.insert(value.id.as_str()) {
                return Err(ConfigurationError::DuplicateId {
                    kind: "task variant value",
                    id: format!("{}.{}", variant.id, value.id),
                });
            }
            if value.excludes.is_empty() {
                continue;
            }
            let patterns = value
                .excludes
                .iter()
                .map(|pattern| {
                    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                        ConfigurationError::InvalidExclusion {
                            category: variant.id.clone(),
                            value: value.id.clone(),
                            pattern: pattern.clone(),
                            reason: e.to_string(),
                        }
                    })
                })
                .collect::<ConfigResult<Vec<_>>>()?;
            compiled.insert((variant.id.clone(), value.id.clone()), patterns);
        }
    }
    Ok(compiled)
}
