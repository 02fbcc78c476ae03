mod common;

use jobgrid_core::config::ConfigCache;
use jobgrid_core::domain::{EnumerationError, JdkProject, Project, TaskKind, TaskVariant};
use jobgrid_core::enumerate::{Enumerator, SpecQuery};
use jobgrid_core::spec::{EqualityFilter, Spec};

fn canonicals<S: Spec>(specs: &[S]) -> Vec<String> {
    specs.iter().map(Spec::canonical).collect()
}

#[test]
fn enumeration_is_deterministic() {
    let cache = common::cache();
    let enumerator = Enumerator::new(&cache);
    let query = SpecQuery::default();

    let first = enumerator.test_specs(&query).unwrap();
    let second = enumerator.test_specs(&query).unwrap();
    assert_eq!(first, second);

    let first = enumerator.build_specs(&query).unwrap();
    let second = enumerator.build_specs(&query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_specs_cover_platforms_providers_tasks_and_variants() {
    let cache = common::cache();
    let specs = Enumerator::new(&cache)
        .test_specs(&SpecQuery::default())
        .unwrap();

    // 4 platform/provider pairs × (build + tck × 2 + jtreg × 2).
    assert_eq!(specs.len(), 20);
    assert_eq!(
        canonicals(&specs[..5]),
        vec![
            "el7.x86_64-vagrant-build",
            "el7.x86_64-vagrant-tck-shenandoah",
            "el7.x86_64-vagrant-tck-g1",
            "el7.x86_64-vagrant-jtreg-shenandoah",
            "el7.x86_64-vagrant-jtreg-g1",
        ]
    );
    assert_eq!(specs[19].canonical(), "win2019.x86_64-none-jtreg-g1");
    assert!(specs
        .iter()
        .filter(|s| s.is_build_task())
        .all(|s| s.axes.variants.is_empty()));
}

#[test]
fn build_specs_respect_project_providers_and_declared_values() {
    let cache = common::cache();
    let specs = Enumerator::new(&cache)
        .build_specs(&SpecQuery::default())
        .unwrap();

    // ojdk8 may only use vagrant (or no provider) and declares two debug
    // modes; ojdk8-tests declares one.
    assert_eq!(specs.len(), 20);
    assert!(!specs
        .iter()
        .any(|s| s.project_id == "ojdk8" && s.axes.provider.as_deref() == Some("beaker")));
    let names = canonicals(&specs);
    assert!(names.contains(&"el7.x86_64-beaker-ojdk8-tests-release.openj9".to_string()));
    assert!(names.contains(&"win2019.x86_64-none-ojdk8-fastdebug.hotspot".to_string()));
    assert!(!names.iter().any(|n| n.contains("slowdebug")));
}

#[test]
fn exclusions_drop_invalid_combinations() {
    let mut snapshot = common::snapshot();
    snapshot.projects = vec![Project::JdkProject(JdkProject {
        id: "ojdk11".to_string(),
        product: common::jdk11(),
        url: "https://example.org/jdk11u".to_string(),
        build_providers: vec![],
        build_platforms: vec![],
    })];
    let cache = ConfigCache::build(snapshot).unwrap();
    let specs = Enumerator::new(&cache)
        .build_specs(&SpecQuery::default())
        .unwrap();

    let on_el7_vagrant: Vec<String> = canonicals(&specs)
        .into_iter()
        .filter(|n| n.starts_with("el7.x86_64-vagrant-"))
        .collect();
    // 3 debug modes × 2 JVMs, minus slowdebug with openj9.
    assert_eq!(on_el7_vagrant.len(), 5);
    assert!(on_el7_vagrant.contains(&"el7.x86_64-vagrant-ojdk11-slowdebug.hotspot".to_string()));
    assert!(!on_el7_vagrant.contains(&"el7.x86_64-vagrant-ojdk11-slowdebug.openj9".to_string()));
}

#[test]
fn masked_axes_deduplicate_keeping_first() {
    let cache = common::cache();
    let filter = EqualityFilter::exact()
        .by_jdk()
        .without_provider()
        .without_variants();
    let specs = Enumerator::new(&cache)
        .build_specs(&SpecQuery::new(filter))
        .unwrap();

    assert_eq!(
        canonicals(&specs),
        vec![
            "el7.x86_64-?-jdk8-?.?",
            "f29.x86_64-?-jdk8-?.?",
            "win2019.x86_64-?-jdk8-?.?",
        ]
    );
    // The survivor is the first candidate of its class.
    assert_eq!(specs[0].axes.provider.as_deref(), Some("vagrant"));
    assert_eq!(specs[0].project_id, "ojdk8");
}

#[test]
fn variant_subset_filter() {
    let cache = common::cache();
    let specs = Enumerator::new(&cache)
        .build_specs(&SpecQuery::new(EqualityFilter::exact().with_variants(["jvm"])))
        .unwrap();

    assert_eq!(specs.len(), 14);
    assert_eq!(specs[0].canonical(), "el7.x86_64-vagrant-ojdk8-?.hotspot");
}

#[test]
fn inclusion_pattern_filters_by_canonical_string() {
    let cache = common::cache();
    let query = SpecQuery::default().including("^f29").unwrap();
    let specs = Enumerator::new(&cache).test_specs(&query).unwrap();

    assert_eq!(specs.len(), 5);
    assert!(specs.iter().all(|s| s.axes.platform.id() == "f29.x86_64"));

    let query = SpecQuery::default().including("tck-g1$").unwrap();
    let specs = Enumerator::new(&cache).test_specs(&query).unwrap();
    assert_eq!(specs.len(), 4);
}

#[test]
fn keys_are_structural() {
    let cache = common::cache();
    let specs = Enumerator::new(&cache)
        .test_specs(&SpecQuery::default())
        .unwrap();
    let mut keys: Vec<_> = specs.iter().map(Spec::key).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), specs.len());
}

#[test]
fn variant_without_values_is_an_error() {
    let mut snapshot = common::snapshot();
    snapshot.task_variants.push(TaskVariant {
        id: "jfr".to_string(),
        kind: TaskKind::Test,
        order: 5,
        default_value: String::new(),
        values: vec![],
    });
    let cache = ConfigCache::build(snapshot).unwrap();

    let err = Enumerator::new(&cache)
        .test_specs(&SpecQuery::default())
        .unwrap_err();
    assert!(matches!(err, EnumerationError::EmptyVariant { ref category } if category == "jfr"));

    // Build enumeration does not involve TEST categories.
    assert!(Enumerator::new(&cache)
        .build_specs(&SpecQuery::default())
        .is_ok());
}
