//! Structural spec identity.
//!
//! `SpecKey` is what deduplication compares. The canonical string is a
//! separate rendering used for display and inclusion patterns; nothing
//! parses it back.

use serde::Serialize;

use crate::domain::{TaskKind, Variants};
use crate::spec::filter::VariantMask;

/// One axis of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPart {
    /// Masked by the equality filter.
    Any,
    /// Not set on the spec (a spec without a provider).
    Absent,
    Is(String),
}

impl KeyPart {
    pub fn masked(compare: bool, value: impl Into<String>) -> Self {
        if compare {
            KeyPart::Is(value.into())
        } else {
            KeyPart::Any
        }
    }

    fn render(&self) -> &str {
        match self {
            KeyPart::Any => "?",
            KeyPart::Absent => "none",
            KeyPart::Is(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpecKey {
    pub kind: TaskKind,
    pub os: KeyPart,
    pub version: KeyPart,
    pub arch: KeyPart,
    pub provider: KeyPart,
    /// Task id (test specs) or project id or JDK (build specs).
    pub subject: KeyPart,
    /// Unmasked `(category, value)` pairs, sorted by category.
    pub variants: Vec<(String, String)>,
}

/// Canonical string: `{os}{version}.{arch}-{provider}-{subject}[-{variants}]`.
///
/// Masked axes render as `?`, a missing provider as `none`. Variant values
/// are dot-joined in axis order with masked categories shown as `?`.
pub fn render_canonical(key: &SpecKey, variants: &Variants, mask: &VariantMask) -> String {
    let mut out = format!(
        "{}{}.{}-{}-{}",
        key.os.render(),
        key.version.render(),
        key.arch.render(),
        key.provider.render(),
        key.subject.render(),
    );
    if !variants.is_empty() {
        let values: Vec<&str> = variants
            .iter()
            .map(|c| {
                if mask.includes(&c.category) {
                    c.value.as_str()
                } else {
                    "?"
                }
            })
            .collect();
        out.push('-');
        out.push_str(&values.join("."));
    }
    out
}
