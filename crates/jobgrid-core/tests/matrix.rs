mod common;

use jobgrid_core::domain::{Job, MatrixError};
use jobgrid_core::enumerate::{Enumerator, SpecQuery};
use jobgrid_core::generator::{generate_all, ConfigTreeGenerator};
use jobgrid_core::matrix::{render_plain, AxisSpecs, Leaf, MatrixBuilder};
use jobgrid_core::spec::EqualityFilter;

struct Fixture {
    cache: jobgrid_core::config::ConfigCache,
    jobs: Vec<Job>,
}

fn fixture() -> Fixture {
    let cache = common::cache();
    let jobs = generate_all(&ConfigTreeGenerator, &cache).unwrap();
    Fixture { cache, jobs }
}

fn axes(f: &Fixture, build_filter: EqualityFilter) -> (AxisSpecs, AxisSpecs) {
    let enumerator = Enumerator::new(&f.cache);
    let builds = enumerator
        .build_specs(&SpecQuery::new(build_filter))
        .unwrap();
    let tests = enumerator.test_specs(&SpecQuery::default()).unwrap();
    (AxisSpecs::Builds(builds), AxisSpecs::Tests(tests))
}

fn job_leaf(name: &str) -> Leaf {
    Leaf::Job {
        name: name.to_string(),
    }
}

#[test]
fn exact_matrix_places_every_job() {
    let f = fixture();
    assert_eq!(f.jobs.len(), 6);
    let (builds, tests) = axes(&f, EqualityFilter::exact());

    let full = MatrixBuilder::new(&f.cache, &f.jobs)
        .build(&builds, &tests, false)
        .unwrap();
    assert_eq!(full.rows(), 20);
    assert_eq!(full.columns(), 20);

    let pruned = MatrixBuilder::new(&f.cache, &f.jobs)
        .build(&builds, &tests, true)
        .unwrap();
    assert_eq!(pruned.rows(), 4);
    assert_eq!(pruned.columns(), 3);
    assert_eq!(pruned.leaf_count(), 6);
    assert_eq!(pruned.leaf_count(), full.leaf_count());

    // Row 0 is ojdk8 release on el7/vagrant; column 1 is tck on f29.
    assert_eq!(
        pruned.cell(0, 1),
        Some(&vec![job_leaf(
            "tck-jdk8-ojdk8-el7.x86_64.vagrant-release.hotspot-f29.x86_64.vagrant-shenandoah"
        )])
    );
    // The build-task column links the project once per declared provider.
    assert_eq!(
        pruned.cell(0, 0),
        Some(&vec![Leaf::Summary {
            project_id: "ojdk8".to_string(),
            provider: "vagrant".to_string(),
        }])
    );
}

#[test]
fn test_project_jobs_appear_under_any_build_provider() {
    let f = fixture();
    let (builds, tests) = axes(&f, EqualityFilter::exact());
    let m = MatrixBuilder::new(&f.cache, &f.jobs)
        .build(&builds, &tests, true)
        .unwrap();

    let jtreg = "jtreg-jdk8-ojdk8-tests-el7.x86_64-release.hotspot-f29.x86_64.vagrant-g1";
    let rows_with_jtreg = (0..m.rows())
        .filter(|&r| m.cell(r, 2) == Some(&vec![job_leaf(jtreg)]))
        .count();
    // el7/vagrant and el7/beaker rows of ojdk8-tests.
    assert_eq!(rows_with_jtreg, 2);
}

#[test]
fn orientation_transposes_interior() {
    let f = fixture();
    let (builds, tests) = axes(&f, EqualityFilter::exact());
    let builder = MatrixBuilder::new(&f.cache, &f.jobs);

    let a = builder.build(&builds, &tests, true).unwrap();
    let b = builder.build(&tests, &builds, true).unwrap();
    assert_eq!(a.rows(), b.columns());
    assert_eq!(a.columns(), b.rows());
    for r in 0..a.rows() {
        for c in 0..a.columns() {
            assert_eq!(a.cell(r, c), b.cell(c, r));
        }
    }
}

#[test]
fn border_titles_and_corners() {
    let f = fixture();
    let (builds, tests) = axes(&f, EqualityFilter::exact());
    let m = MatrixBuilder::new(&f.cache, &f.jobs)
        .build(&builds, &tests, true)
        .unwrap();
    let grid = m.grid();

    assert_eq!(grid.len(), m.rows() + 2);
    let title = |text: &str| {
        vec![Leaf::Title {
            text: text.to_string(),
        }]
    };
    assert_eq!(grid[0][1], title("el7.x86_64-vagrant-build"));
    assert_eq!(grid[m.rows() + 1][1], title("el7.x86_64-vagrant-build"));
    assert_eq!(grid[1][0], title("el7.x86_64-vagrant-ojdk8-release.hotspot"));
    assert_eq!(
        grid[1][m.columns() + 1],
        title("el7.x86_64-vagrant-ojdk8-release.hotspot")
    );
    assert_eq!(
        grid[0][0],
        vec![Leaf::Aggregate {
            text: "total: 6".to_string()
        }]
    );
    assert_eq!(
        grid[m.rows() + 1][m.columns() + 1],
        vec![Leaf::Aggregate {
            text: "filled: 6".to_string()
        }]
    );
}

#[test]
fn colspan_follows_widest_cell() {
    let f = fixture();
    let filter = EqualityFilter::exact()
        .by_jdk()
        .without_provider()
        .without_variants();
    let (builds, tests) = axes(&f, filter);
    let m = MatrixBuilder::new(&f.cache, &f.jobs)
        .build(&builds, &tests, true)
        .unwrap();

    // One el7 row; build, tck and jtreg columns.
    assert_eq!(m.rows(), 1);
    assert_eq!(m.columns(), 3);
    assert_eq!(m.cell(0, 1).map(Vec::len), Some(2));
    assert_eq!(m.colspans(), vec![1, 1, 2, 1, 1]);

    let text = render_plain(&m);
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn axes_must_differ_in_kind() {
    let f = fixture();
    let (builds, tests) = axes(&f, EqualityFilter::exact());
    let builder = MatrixBuilder::new(&f.cache, &f.jobs);

    assert!(matches!(
        builder.build(&builds, &builds, false),
        Err(MatrixError::SameAxisKind { kind: "build" })
    ));
    assert!(matches!(
        builder.build(&tests, &tests, false),
        Err(MatrixError::SameAxisKind { kind: "test" })
    ));
}
