//! Coverage matrix: build specs against test specs.
//!
//! A matrix is computed in one pass into an immutable grid. The interior
//! holds the jobs lying on both the row spec and the column spec; a border
//! of title leaves frames it on all four sides, and the corners carry
//! aggregate labels computed after traversal.

pub mod render;

use serde::Serialize;

use crate::config::ConfigCache;
use crate::domain::{Job, MatrixError, TaskKind};
use crate::obs;
use crate::spec::{BuildSpec, Spec, TestSpec};

pub use render::render_plain;

/// Specs along one axis of the matrix.
#[derive(Debug, Clone)]
pub enum AxisSpecs {
    Builds(Vec<BuildSpec>),
    Tests(Vec<TestSpec>),
}

impl AxisSpecs {
    pub fn kind(&self) -> TaskKind {
        match self {
            AxisSpecs::Builds(_) => TaskKind::Build,
            AxisSpecs::Tests(_) => TaskKind::Test,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AxisSpecs::Builds(specs) => specs.len(),
            AxisSpecs::Tests(specs) => specs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn titles(&self) -> Vec<String> {
        match self {
            AxisSpecs::Builds(specs) => specs.iter().map(Spec::canonical).collect(),
            AxisSpecs::Tests(specs) => specs.iter().map(Spec::canonical).collect(),
        }
    }
}

/// One entry of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "leaf", rename_all = "snake_case")]
pub enum Leaf {
    /// Border title: the canonical string of a row or column spec.
    Title { text: String },
    /// Corner label summarising the grid.
    Aggregate { text: String },
    /// A job lying on both specs.
    Job { name: String },
    /// Project-level link in a build-task cell, one per usable provider.
    Summary { project_id: String, provider: String },
}

pub type Cell = Vec<Leaf>;

/// A framed grid. Row 0 and the last row are border rows; column 0 and the
/// last column are border columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matrix {
    grid: Vec<Vec<Cell>>,
}

impl Matrix {
    /// The whole grid, borders included.
    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    /// Number of interior rows.
    pub fn rows(&self) -> usize {
        self.grid.len().saturating_sub(2)
    }

    /// Number of interior columns.
    pub fn columns(&self) -> usize {
        self.grid
            .first()
            .map_or(0, |row| row.len().saturating_sub(2))
    }

    /// Interior cell at `(row, column)`, zero-based inside the border.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        if row >= self.rows() || column >= self.columns() {
            return None;
        }
        self.grid.get(row + 1).and_then(|r| r.get(column + 1))
    }

    /// Leaves in the interior.
    pub fn leaf_count(&self) -> usize {
        (0..self.rows())
            .flat_map(|r| (0..self.columns()).map(move |c| (r, c)))
            .filter_map(|(r, c)| self.cell(r, c))
            .map(Vec::len)
            .sum()
    }

    /// Per grid column, the largest number of leaves found in it, at
    /// least 1.
    pub fn colspans(&self) -> Vec<usize> {
        let width = self.grid.first().map_or(0, Vec::len);
        (0..width)
            .map(|c| {
                self.grid
                    .iter()
                    .filter_map(|row| row.get(c))
                    .map(Vec::len)
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect()
    }
}

/// Builds matrices over a fixed job set.
pub struct MatrixBuilder<'a> {
    cache: &'a ConfigCache,
    jobs: &'a [Job],
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(cache: &'a ConfigCache, jobs: &'a [Job]) -> Self {
        Self { cache, jobs }
    }

    /// Build the matrix of `rows` against `columns`. One axis must hold build
    /// specs and the other test specs, in either orientation.
    ///
    /// With `prune`, interior rows and columns without a single leaf are
    /// dropped; the border is always kept.
    pub fn build(
        &self,
        rows: &AxisSpecs,
        columns: &AxisSpecs,
        prune: bool,
    ) -> Result<Matrix, MatrixError> {
        let (builds, tests, builds_on_rows) = match (rows, columns) {
            (AxisSpecs::Builds(b), AxisSpecs::Tests(t)) => (b, t, true),
            (AxisSpecs::Tests(t), AxisSpecs::Builds(b)) => (b, t, false),
            (AxisSpecs::Builds(_), AxisSpecs::Builds(_)) => {
                return Err(MatrixError::SameAxisKind { kind: "build" })
            }
            (AxisSpecs::Tests(_), AxisSpecs::Tests(_)) => {
                return Err(MatrixError::SameAxisKind { kind: "test" })
            }
        };

        let interior: Vec<Vec<Cell>> = (0..rows.len())
            .map(|r| {
                (0..columns.len())
                    .map(|c| {
                        let (b, t) = if builds_on_rows { (r, c) } else { (c, r) };
                        self.cell(&builds[b], &tests[t])
                    })
                    .collect()
            })
            .collect();

        let (interior, kept_rows, kept_columns) = if prune {
            prune_empty(interior)
        } else {
            let all_rows = (0..rows.len()).collect();
            let all_columns = (0..columns.len()).collect();
            (interior, all_rows, all_columns)
        };
        let row_titles = pick(rows.titles(), &kept_rows);
        let column_titles = pick(columns.titles(), &kept_columns);

        let matrix = frame(interior, &row_titles, &column_titles);
        obs::emit_matrix_built(matrix.rows(), matrix.columns(), matrix.leaf_count(), prune);
        Ok(matrix)
    }

    fn cell(&self, build: &BuildSpec, test: &TestSpec) -> Cell {
        let linked = self
            .jobs
            .iter()
            .filter(|job| build.matches_job(job) && test.matches_job(job));

        if test.is_build_task() {
            self.summary_links(linked)
        } else {
            linked.map(|job| Leaf::Job { name: job.name() }).collect()
        }
    }

    /// One link per project and usable provider. A project that declares no
    /// providers links the providers its matched jobs were built with.
    fn summary_links<'j>(&self, jobs: impl Iterator<Item = &'j Job>) -> Cell {
        let mut projects: Vec<(String, Vec<String>)> = Vec::new();
        for job in jobs {
            let Job::Build(build) = job else { continue };
            let index = match projects.iter().position(|(id, _)| *id == build.project_id) {
                Some(index) => index,
                None => {
                    projects.push((build.project_id.clone(), Vec::new()));
                    projects.len() - 1
                }
            };
            let providers = &mut projects[index].1;
            if !providers.contains(&build.provider) {
                providers.push(build.provider.clone());
            }
        }

        projects
            .into_iter()
            .flat_map(|(project_id, seen)| {
                let providers = self
                    .cache
                    .project(&project_id)
                    .map(|p| p.build_providers().to_vec())
                    .filter(|declared| !declared.is_empty())
                    .unwrap_or(seen);
                providers.into_iter().map(move |provider| Leaf::Summary {
                    project_id: project_id.clone(),
                    provider,
                })
            })
            .collect()
    }
}

/// Drop interior rows and columns whose leaf total is zero. Returns the
/// pruned grid with the indices kept on each axis.
fn prune_empty(interior: Vec<Vec<Cell>>) -> (Vec<Vec<Cell>>, Vec<usize>, Vec<usize>) {
    let width = interior.first().map_or(0, Vec::len);
    let kept_rows: Vec<usize> = interior
        .iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.is_empty()))
        .map(|(i, _)| i)
        .collect();
    let kept_columns: Vec<usize> = (0..width)
        .filter(|&c| interior.iter().any(|row| !row[c].is_empty()))
        .collect();

    let pruned = interior
        .into_iter()
        .enumerate()
        .filter(|(i, _)| kept_rows.contains(i))
        .map(|(_, row)| pick(row, &kept_columns))
        .collect();
    (pruned, kept_rows, kept_columns)
}

fn pick<T>(items: Vec<T>, keep: &[usize]) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, item)| item)
        .collect()
}

fn title(text: &str) -> Cell {
    vec![Leaf::Title {
        text: text.to_string(),
    }]
}

fn aggregate(text: String) -> Cell {
    vec![Leaf::Aggregate { text }]
}

/// Wrap an interior grid in title rows and columns, then fill the corners.
fn frame(interior: Vec<Vec<Cell>>, row_titles: &[String], column_titles: &[String]) -> Matrix {
    let total: usize = interior.iter().flatten().map(Vec::len).sum();
    let filled = interior.iter().flatten().filter(|c| !c.is_empty()).count();

    let border_row = |left: Cell, right: Cell| -> Vec<Cell> {
        std::iter::once(left)
            .chain(column_titles.iter().map(|t| title(t)))
            .chain(std::iter::once(right))
            .collect()
    };

    let top = border_row(
        aggregate(format!("total: {total}")),
        aggregate(format!("rows: {}", row_titles.len())),
    );
    let bottom = border_row(
        aggregate(format!("columns: {}", column_titles.len())),
        aggregate(format!("filled: {filled}")),
    );

    let body = interior
        .into_iter()
        .zip(row_titles)
        .map(|(cells, row_title)| {
            std::iter::once(title(row_title))
                .chain(cells)
                .chain(std::iter::once(title(row_title)))
                .collect::<Vec<Cell>>()
        });

    let grid = std::iter::once(top)
        .chain(body)
        .chain(std::iter::once(bottom))
        .collect();
    Matrix { grid }
}
