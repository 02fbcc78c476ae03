//! Task variants: the named configuration axes of builds and tests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a task (or a variant axis) belongs to building or to testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskKind {
    Build,
    Test,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Build => f.write_str("BUILD"),
            TaskKind::Test => f.write_str("TEST"),
        }
    }
}

/// One allowed value of a variant axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskVariantValue {
    pub id: String,

    /// Patterns (anchored regular expressions) over other value ids that may
    /// not appear in the same combination as this value.
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// A variant axis such as `debugMode` or `garbageCollector`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskVariant {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: TaskKind,

    /// Position of this axis in names and combinations.
    #[serde(default)]
    pub order: u32,

    pub default_value: String,

    /// Allowed values in declared order.
    pub values: Vec<TaskVariantValue>,
}

impl TaskVariant {
    pub fn value(&self, id: &str) -> Option<&TaskVariantValue> {
        self.values.iter().find(|v| v.id == id)
    }

    pub fn choice(&self, value: &str) -> VariantChoice {
        VariantChoice {
            order: self.order,
            category: self.id.clone(),
            value: value.to_string(),
        }
    }
}

/// A single resolved `category = value` pair.
///
/// Ordering is by axis order first, so a sorted list of choices is already
/// in naming order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantChoice {
    pub order: u32,
    pub category: String,
    pub value: String,
}

/// A resolved variant combination: at most one value per category, kept in
/// axis order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variants(Vec<VariantChoice>);

impl Variants {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from choices; sorts into axis order and keeps the first choice
    /// seen for each category.
    pub fn new(choices: impl IntoIterator<Item = VariantChoice>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut kept: Vec<VariantChoice> = choices
            .into_iter()
            .filter(|c| seen.insert(c.category.clone()))
            .collect();
        kept.sort();
        Self(kept)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantChoice> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value chosen for `category`, if present.
    pub fn get(&self, category: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.value.as_str())
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.get(category).is_some()
    }

    /// Copy without the given category.
    pub fn without(&self, category: &str) -> Self {
        Self(
            self.0
                .iter()
                .filter(|c| c.category != category)
                .cloned()
                .collect(),
        )
    }

    /// `(category, value)` pairs sorted by category id, independent of
    /// axis order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .0
            .iter()
            .map(|c| (c.category.clone(), c.value.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

/// Dot-joined values in axis order, e.g. `release.hotspot`.
impl fmt::Display for Variants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&c.value)?;
        }
        Ok(())
    }
}

impl FromIterator<VariantChoice> for Variants {
    fn from_iter<T: IntoIterator<Item = VariantChoice>>(iter: T) -> Self {
        Self::new(iter)
    }
}
