//! Projects and their declarative job configuration trees.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The JDK a project builds or tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// JDK version id, e.g. `jdk8`.
    pub jdk: String,

    /// Distribution package name, e.g. `java-1.8.0-openjdk`.
    pub package_name: String,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package_name, self.jdk)
    }
}

/// A test task on a test platform with the test-variant maps to run it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestTaskConfig {
    pub task: String,

    /// One job per map; an empty list means one job with default values.
    #[serde(default)]
    pub variants: Vec<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlatformConfig {
    pub platform: String,
    pub provider: String,
    pub tasks: Vec<TestTaskConfig>,
}

/// One build-variant map and the test platforms its build is tested on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildVariantsConfig {
    #[serde(default)]
    pub variants: BTreeMap<String, String>,

    #[serde(default)]
    pub test_platforms: Vec<TestPlatformConfig>,
}

/// A platform a project is built on (or whose builds a test project tests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlatformConfig {
    pub platform: String,

    /// Required for projects that build; absent for test-only projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    pub variants: Vec<BuildVariantsConfig>,
}

/// A project that pulls sources, builds and tests them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdkProject {
    pub id: String,
    pub product: Product,
    pub url: String,

    #[serde(default)]
    pub build_providers: Vec<String>,

    #[serde(default)]
    pub build_platforms: Vec<BuildPlatformConfig>,
}

/// A project that only tests builds taken from an artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdkTestProject {
    pub id: String,
    pub product: Product,

    #[serde(default)]
    pub build_providers: Vec<String>,

    #[serde(default)]
    pub build_platforms: Vec<BuildPlatformConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Project {
    JdkProject(JdkProject),
    JdkTestProject(JdkTestProject),
}

impl Project {
    pub fn id(&self) -> &str {
        match self {
            Project::JdkProject(p) => &p.id,
            Project::JdkTestProject(p) => &p.id,
        }
    }

    pub fn product(&self) -> &Product {
        match self {
            Project::JdkProject(p) => &p.product,
            Project::JdkTestProject(p) => &p.product,
        }
    }

    /// Provider ids this project may use. Empty means unrestricted.
    pub fn build_providers(&self) -> &[String] {
        match self {
            Project::JdkProject(p) => &p.build_providers,
            Project::JdkTestProject(p) => &p.build_providers,
        }
    }

    pub fn build_platforms(&self) -> &[BuildPlatformConfig] {
        match self {
            Project::JdkProject(p) => &p.build_platforms,
            Project::JdkTestProject(p) => &p.build_platforms,
        }
    }

    pub fn is_test_project(&self) -> bool {
        matches!(self, Project::JdkTestProject(_))
    }

    /// Whether the project may use `provider`.
    pub fn allows_provider(&self, provider: &str) -> bool {
        let providers = self.build_providers();
        providers.is_empty() || providers.iter().any(|p| p == provider)
    }
}
