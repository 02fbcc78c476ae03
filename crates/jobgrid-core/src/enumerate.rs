//! Enumeration of the job space.
//!
//! Builds every `BuildSpec` and `TestSpec` the configuration implies, in a
//! deterministic order: platform, then provider, then project or task, then
//! variant combination. Each of those follows declared order.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;

use crate::config::ConfigCache;
use crate::domain::{
    EnumerationError, Platform, Project, TaskKind, TaskVariant, VariantChoice, Variants,
};
use crate::obs;
use crate::spec::{BuildSpec, EqualityFilter, Spec, SpecAxes, TestSpec};

/// Identity filter and inclusion pattern applied to every candidate.
#[derive(Debug, Clone, Default)]
pub struct SpecQuery {
    pub filter: EqualityFilter,
    /// Candidates whose canonical string does not match are dropped.
    pub include: Option<Regex>,
}

impl SpecQuery {
    pub fn new(filter: EqualityFilter) -> Self {
        Self {
            filter,
            include: None,
        }
    }

    /// Add an inclusion pattern, searched anywhere in the canonical string.
    pub fn including(mut self, pattern: &str) -> Result<Self, EnumerationError> {
        let regex = Regex::new(pattern).map_err(|e| EnumerationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.include = Some(regex);
        Ok(self)
    }

    fn admits(&self, canonical: &str) -> bool {
        self.include
            .as_ref()
            .map_or(true, |regex| regex.is_match(canonical))
    }
}

/// Every combination taking one choice from each list, in list order with
/// the first list varying slowest. An empty input yields one empty
/// combination.
pub fn cartesian(lists: &[Vec<VariantChoice>]) -> Vec<Variants> {
    lists
        .iter()
        .fold(vec![Vec::<VariantChoice>::new()], |acc, list| {
            acc.iter()
                .flat_map(|prefix| {
                    list.iter().map(move |choice| {
                        let mut next = prefix.clone();
                        next.push(choice.clone());
                        next
                    })
                })
                .collect()
        })
        .into_iter()
        .map(Variants::new)
        .collect()
}

pub struct Enumerator<'a> {
    cache: &'a ConfigCache,
}

impl<'a> Enumerator<'a> {
    pub fn new(cache: &'a ConfigCache) -> Self {
        Self { cache }
    }

    /// Platform × provider × task × test-variant combination.
    ///
    /// Tasks that are not TEST tasks (the build task) yield one variant-free
    /// spec per platform and provider.
    pub fn test_specs(&self, query: &SpecQuery) -> Result<Vec<TestSpec>, EnumerationError> {
        let combinations = self.combinations(TaskKind::Test, &BTreeMap::new())?;

        let mut candidates = Vec::new();
        for platform in self.cache.platforms() {
            for provider in providers_of(platform) {
                for task in self.cache.tasks() {
                    let spec = |variants: Variants| TestSpec {
                        axes: SpecAxes {
                            platform: platform.clone(),
                            provider: provider.map(str::to_string),
                            variants,
                            filter: query.filter.clone(),
                        },
                        task: task.clone(),
                    };
                    if task.kind == TaskKind::Test {
                        candidates.extend(combinations.iter().cloned().map(spec));
                    } else {
                        candidates.push(spec(Variants::empty()));
                    }
                }
            }
        }
        Ok(self.finish("test", candidates, query))
    }

    /// Platform × provider × project × build-variant combination.
    ///
    /// Providers are restricted to the project's usable providers when it
    /// declares any. A category the project declares values for enumerates
    /// only those values.
    pub fn build_specs(&self, query: &SpecQuery) -> Result<Vec<BuildSpec>, EnumerationError> {
        let per_project = self
            .cache
            .projects()
            .iter()
            .map(|project| {
                let used = used_build_values(self.cache, project);
                self.combinations(TaskKind::Build, &used)
                    .map(|combinations| (project, combinations))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut candidates = Vec::new();
        for platform in self.cache.platforms() {
            for provider in providers_of(platform) {
                for (project, combinations) in &per_project {
                    if provider.is_some_and(|p| !project.allows_provider(p)) {
                        continue;
                    }
                    candidates.extend(combinations.iter().cloned().map(|variants| BuildSpec {
                        axes: SpecAxes {
                            platform: platform.clone(),
                            provider: provider.map(str::to_string),
                            variants,
                            filter: query.filter.clone(),
                        },
                        project_id: project.id().to_string(),
                        product: project.product().clone(),
                    }));
                }
            }
        }
        Ok(self.finish("build", candidates, query))
    }

    /// Valid combinations of all `kind` variants. `restrict` narrows a
    /// category to the listed values.
    fn combinations(
        &self,
        kind: TaskKind,
        restrict: &BTreeMap<String, Vec<String>>,
    ) -> Result<Vec<Variants>, EnumerationError> {
        let lists = self
            .cache
            .variants_of_kind(kind)
            .map(|variant| choices(variant, restrict.get(&variant.id)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cartesian(&lists)
            .into_iter()
            .filter(|combination| !self.cache.violates_exclusions(combination))
            .collect())
    }

    fn finish<S: Spec>(&self, kind: &str, candidates: Vec<S>, query: &SpecQuery) -> Vec<S> {
        let total = candidates.len();
        let mut seen = HashSet::new();
        let mut excluded = 0;
        let kept: Vec<S> = candidates
            .into_iter()
            .filter(|spec| {
                if query.admits(&spec.canonical()) {
                    true
                } else {
                    excluded += 1;
                    false
                }
            })
            .filter(|spec| seen.insert(spec.key()))
            .collect();
        obs::emit_enumerated(kind, total, excluded, kept.len());
        kept
    }
}

/// A platform's providers, or a single `None` placeholder when it has none.
fn providers_of(platform: &Platform) -> Vec<Option<&str>> {
    let providers: Vec<Option<&str>> = platform.provider_ids().map(Some).collect();
    if providers.is_empty() {
        vec![None]
    } else {
        providers
    }
}

fn choices(
    variant: &TaskVariant,
    only: Option<&Vec<String>>,
) -> Result<Vec<VariantChoice>, EnumerationError> {
    if variant.values.is_empty() {
        return Err(EnumerationError::EmptyVariant {
            category: variant.id.clone(),
        });
    }
    Ok(variant
        .values
        .iter()
        .filter(|value| only.map_or(true, |only| only.contains(&value.id)))
        .map(|value| variant.choice(&value.id))
        .collect())
}

/// Build-variant values a project actually uses, per category it declares.
///
/// When some build maps declare a category and others leave it out, the
/// default value counts as used too.
fn used_build_values(cache: &ConfigCache, project: &Project) -> BTreeMap<String, Vec<String>> {
    let maps: Vec<&BTreeMap<String, String>> = project
        .build_platforms()
        .iter()
        .flat_map(|platform| platform.variants.iter().map(|build| &build.variants))
        .collect();

    cache
        .variants_of_kind(TaskKind::Build)
        .filter(|variant| maps.iter().any(|map| map.contains_key(&variant.id)))
        .map(|variant| {
            let used: Vec<String> = maps
                .iter()
                .map(|map| {
                    map.get(&variant.id)
                        .cloned()
                        .unwrap_or_else(|| variant.default_value.clone())
                })
                .collect();
            (variant.id.clone(), used)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(category: &str, order: u32, values: &[&str]) -> Vec<VariantChoice> {
        values
            .iter()
            .map(|v| VariantChoice {
                order,
                category: category.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    #[test]
    fn cartesian_size_is_product_of_sizes() {
        let lists = vec![
            list("a", 1, &["1", "2", "3"]),
            list("b", 2, &["x", "y"]),
            list("c", 3, &["p", "q"]),
        ];
        let combos = cartesian(&lists);
        assert_eq!(combos.len(), 12);
        assert_eq!(combos[0].to_string(), "1.x.p");
        assert_eq!(combos[1].to_string(), "1.x.q");
        assert_eq!(combos[11].to_string(), "3.y.q");
    }

    #[test]
    fn cartesian_of_nothing_is_one_empty_combination() {
        let combos = cartesian(&[]);
        assert_eq!(combos.len(), 1);
        assert!(combos[0].is_empty());
    }

    #[test]
    fn invalid_inclusion_pattern() {
        let err = SpecQuery::default().including("(").unwrap_err();
        assert!(matches!(err, EnumerationError::InvalidPattern { .. }));
    }
}
