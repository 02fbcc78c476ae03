//! Which axes take part in spec equality.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::Variants;

/// Variant categories compared when matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "categories")]
pub enum VariantMask {
    #[default]
    All,
    None,
    Only(BTreeSet<String>),
}

impl VariantMask {
    pub fn includes(&self, category: &str) -> bool {
        match self {
            VariantMask::All => true,
            VariantMask::None => false,
            VariantMask::Only(categories) => categories.contains(category),
        }
    }

    /// `(category, value)` pairs that survive the mask, sorted by category.
    pub fn apply(&self, variants: &Variants) -> Vec<(String, String)> {
        variants
            .pairs()
            .into_iter()
            .filter(|(category, _)| self.includes(category))
            .collect()
    }
}

/// Axes compared when two specs are checked for identity, or a spec is
/// checked against a job. A masked axis matches anything.
///
/// `id` compares the project (build specs) or task (test specs). With `id`
/// masked, build specs fall back to comparing the project's JDK when `jdk`
/// is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualityFilter {
    pub os: bool,
    pub version: bool,
    pub arch: bool,
    pub provider: bool,
    pub id: bool,
    pub jdk: bool,
    pub variants: VariantMask,
}

impl Default for EqualityFilter {
    fn default() -> Self {
        Self::exact()
    }
}

impl EqualityFilter {
    /// Every axis compared.
    pub fn exact() -> Self {
        Self {
            os: true,
            version: true,
            arch: true,
            provider: true,
            id: true,
            jdk: true,
            variants: VariantMask::All,
        }
    }

    /// Nothing compared; every spec is identical to every other.
    pub fn none() -> Self {
        Self {
            os: false,
            version: false,
            arch: false,
            provider: false,
            id: false,
            jdk: false,
            variants: VariantMask::None,
        }
    }

    pub fn without_provider(mut self) -> Self {
        self.provider = false;
        self
    }

    pub fn without_variants(mut self) -> Self {
        self.variants = VariantMask::None;
        self
    }

    /// Compare the project's JDK instead of the project id.
    pub fn by_jdk(mut self) -> Self {
        self.id = false;
        self.jdk = true;
        self
    }

    pub fn with_variants(mut self, categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.variants = VariantMask::Only(categories.into_iter().map(Into::into).collect());
        self
    }
}
