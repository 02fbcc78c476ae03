//! Shared configuration fixture.
//!
//! Providers: vagrant, beaker.
//! Platforms: el7.x86_64 (vagrant, beaker), f29.x86_64 (vagrant),
//! win2019.x86_64 (no providers).
//! Variants: debugMode BUILD [release, fastdebug, slowdebug] where slowdebug
//! excludes openj9; jvm BUILD [hotspot, openj9]; garbageCollector TEST
//! [shenandoah, g1].
//! Tasks: tck, jtreg (TEST), plus the synthetic build task.
//! Projects:
//! - ojdk8 (JdkProject, providers [vagrant]): builds release and fastdebug on
//!   el7/vagrant, each tested by tck on f29/vagrant with default variants.
//! - ojdk8-tests (JdkTestProject): tests the release build from el7 with
//!   jtreg on f29/vagrant with g1.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use jobgrid_core::config::{ConfigCache, ConfigSnapshot};
use jobgrid_core::domain::{
    BuildPlatformConfig, BuildVariantsConfig, JdkProject, JdkTestProject, Platform,
    PlatformProvider, Product, Project, Provider, Task, TaskKind, TaskVariant, TaskVariantValue,
    TestPlatformConfig, TestStability, TestTaskConfig,
};

pub fn platform(os: &str, version: &str, providers: &[&str]) -> Platform {
    Platform {
        os: os.to_string(),
        version: version.to_string(),
        architecture: "x86_64".to_string(),
        alias: None,
        providers: providers
            .iter()
            .map(|id| PlatformProvider {
                id: id.to_string(),
                hw_nodes: vec![],
                vm_nodes: vec![format!("{id}-vm")],
            })
            .collect(),
        vm_name: format!("{os}{version}"),
        test_stability: TestStability::default(),
        tags: vec![],
        variables: BTreeMap::new(),
    }
}

pub fn provider(id: &str) -> Provider {
    Provider {
        id: id.to_string(),
        hw_nodes: vec![],
        vm_nodes: vec![format!("{id}-vm")],
    }
}

pub fn variant(id: &str, kind: TaskKind, order: u32, values: &[&str]) -> TaskVariant {
    TaskVariant {
        id: id.to_string(),
        kind,
        order,
        default_value: values[0].to_string(),
        values: values
            .iter()
            .map(|v| TaskVariantValue {
                id: v.to_string(),
                excludes: vec![],
            })
            .collect(),
    }
}

pub fn test_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        kind: TaskKind::Test,
        ..Task::build()
    }
}

pub fn jdk8() -> Product {
    Product {
        jdk: "jdk8".to_string(),
        package_name: "java-1.8.0-openjdk".to_string(),
    }
}

pub fn jdk11() -> Product {
    Product {
        jdk: "jdk11".to_string(),
        package_name: "java-11-openjdk".to_string(),
    }
}

pub fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn tested_on_f29(task: &str, variants: Vec<BTreeMap<String, String>>) -> Vec<TestPlatformConfig> {
    vec![TestPlatformConfig {
        platform: "f29.x86_64".to_string(),
        provider: "vagrant".to_string(),
        tasks: vec![TestTaskConfig {
            task: task.to_string(),
            variants,
        }],
    }]
}

pub fn ojdk8() -> Project {
    Project::JdkProject(JdkProject {
        id: "ojdk8".to_string(),
        product: jdk8(),
        url: "https://example.org/jdk8u".to_string(),
        build_providers: vec!["vagrant".to_string()],
        build_platforms: vec![BuildPlatformConfig {
            platform: "el7.x86_64".to_string(),
            provider: Some("vagrant".to_string()),
            variants: vec![
                BuildVariantsConfig {
                    variants: map(&[("debugMode", "release")]),
                    test_platforms: tested_on_f29("tck", vec![]),
                },
                BuildVariantsConfig {
                    variants: map(&[("debugMode", "fastdebug")]),
                    test_platforms: tested_on_f29("tck", vec![]),
                },
            ],
        }],
    })
}

pub fn ojdk8_tests() -> Project {
    Project::JdkTestProject(JdkTestProject {
        id: "ojdk8-tests".to_string(),
        product: jdk8(),
        build_providers: vec![],
        build_platforms: vec![BuildPlatformConfig {
            platform: "el7.x86_64".to_string(),
            provider: None,
            variants: vec![BuildVariantsConfig {
                variants: map(&[("debugMode", "release")]),
                test_platforms: tested_on_f29("jtreg", vec![map(&[("garbageCollector", "g1")])]),
            }],
        }],
    })
}

pub fn snapshot() -> ConfigSnapshot {
    let mut debug_mode = variant(
        "debugMode",
        TaskKind::Build,
        1,
        &["release", "fastdebug", "slowdebug"],
    );
    debug_mode.values[2].excludes.push("openj9".to_string());

    ConfigSnapshot {
        platforms: vec![
            platform("el", "7", &["vagrant", "beaker"]),
            platform("f", "29", &["vagrant"]),
            platform("win", "2019", &[]),
        ],
        providers: vec![provider("vagrant"), provider("beaker")],
        tasks: vec![test_task("tck"), test_task("jtreg")],
        task_variants: vec![
            debug_mode,
            variant("jvm", TaskKind::Build, 2, &["hotspot", "openj9"]),
            variant(
                "garbageCollector",
                TaskKind::Test,
                1,
                &["shenandoah", "g1"],
            ),
        ],
        projects: vec![ojdk8(), ojdk8_tests()],
    }
}

pub fn cache() -> ConfigCache {
    ConfigCache::build(snapshot()).expect("fixture configuration is valid")
}

/// Write the fixture as a configuration directory tree.
pub fn write_config_tree(root: &Path) {
    let snap = snapshot();
    let write = |dir: &str, file: &str, value: serde_json::Value| {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(format!("{file}.json")),
            serde_json::to_string_pretty(&value).unwrap(),
        )
        .unwrap();
    };

    for (i, p) in snap.platforms.iter().enumerate() {
        write("platforms", &format!("{i:02}-{}", p.id()), serde_json::to_value(p).unwrap());
    }
    for p in &snap.providers {
        write("buildProviders", &p.id, serde_json::to_value(p).unwrap());
    }
    for t in &snap.tasks {
        write("tasks", &t.id, serde_json::to_value(t).unwrap());
    }
    for v in &snap.task_variants {
        write("taskVariants", &v.id, serde_json::to_value(v).unwrap());
    }
    for project in &snap.projects {
        match project {
            Project::JdkProject(p) => {
                write("jdkProjects", &p.id, serde_json::to_value(p).unwrap())
            }
            Project::JdkTestProject(p) => {
                write("jdkTestProjects", &p.id, serde_json::to_value(p).unwrap())
            }
        }
    }
}
