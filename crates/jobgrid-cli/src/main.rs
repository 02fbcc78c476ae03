//! jobgrid - CI job-space CLI
//!
//! The `jobgrid` command enumerates the job space a configuration tree
//! describes and keeps a job store in step with it.
//!
//! ## Commands
//!
//! - `specs`: enumerate build or test specs under an equality filter
//! - `matrix`: coverage matrix of build specs against test specs
//! - `jobs`: list the jobs the configuration derives
//! - `reconcile`: create, update, archive and revive stored jobs
//! - `bump`: move jobs to another platform, product or provider
//! - `remove-variant`: drop a variant category from every job

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use jobgrid_core::obs::RunSpan;
use jobgrid_core::{
    bump, generate_all, init_tracing, render_plain, AxisSpecs, BumpOutcome, BumpScope,
    CollisionPolicy, ConfigTreeGenerator, DeployedJobs, EnumerationError, EqualityFilter,
    Enumerator, Job, JobModifier, JsonJobRenderer, MatrixBuilder, PlatformBumper, Product,
    ProductBumper, ProviderBumper, ReconcileReport, Reconciler, RunContext, Settings, Spec,
    SpecQuery, TaskKind, TaskVariant, VariantRemover,
};
use jobgrid_store::{CommandNotifier, FsJobStore};
use regex::Regex;
use serde::Serialize;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "jobgrid")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI job-space enumeration and job-store reconciliation", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, global = true, env = "JOBGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Configuration record tree
    #[arg(long, global = true, env = "JOBGRID_CONFIG_ROOT")]
    config_root: Option<PathBuf>,

    /// Directory of active job definitions
    #[arg(long, global = true, env = "JOBGRID_JOBS_ROOT")]
    jobs_root: Option<PathBuf>,

    /// Directory of archived job definitions
    #[arg(long, global = true, env = "JOBGRID_ARCHIVE_ROOT")]
    archive_root: Option<PathBuf>,

    /// Maximum store actions in flight
    #[arg(long, global = true, env = "JOBGRID_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Output format of command results
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate build or test specs
    Specs {
        #[arg(value_enum)]
        axis: Axis,

        #[command(flatten)]
        filter: FilterArgs,

        /// Keep specs whose canonical string matches this pattern
        #[arg(long)]
        include: Option<String>,
    },

    /// Coverage matrix of build specs against test specs
    Matrix(MatrixArgs),

    /// List the jobs the configuration derives
    Jobs {
        /// Only jobs of this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Bring the job store in line with the configuration
    Reconcile {
        /// Print the plan without touching the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Rename jobs by moving them along one axis, then reconcile
    Bump {
        #[command(subcommand)]
        target: BumpTarget,
    },

    /// Drop a variant category from every job that has it, then reconcile
    RemoveVariant {
        /// Task variant id
        variant: String,

        /// Archived build-artifact label ({buildVariants}.{platform}) to
        /// rewrite the same way; repeatable
        #[arg(long = "artifact-label", value_name = "LABEL")]
        artifact_labels: Vec<String>,

        #[command(flatten)]
        apply: ApplyArgs,
    },
}

#[derive(Subcommand)]
enum BumpTarget {
    /// Move jobs from one platform to another
    Platform {
        /// Platform id, e.g. el7.x86_64
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, value_enum, default_value_t = Scope::Both)]
        scope: Scope,

        /// Only bump jobs whose name matches this pattern
        #[arg(long)]
        filter: Option<String>,

        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Move jobs from one JDK to another
    Product {
        /// JDK id currently used by at least one project, e.g. jdk8
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Package name of the new product (default: unchanged)
        #[arg(long)]
        package: Option<String>,

        #[command(flatten)]
        apply: ApplyArgs,
    },

    /// Move jobs from one build provider to another
    Provider {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, value_enum, default_value_t = Scope::Both)]
        scope: Scope,

        /// Only bump jobs whose name matches this pattern
        #[arg(long)]
        filter: Option<String>,

        #[command(flatten)]
        apply: ApplyArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct ApplyArgs {
    /// Apply non-colliding renames instead of aborting on any collision
    #[arg(long)]
    keep_bumped: bool,

    /// Print the store plan without applying it
    #[arg(long)]
    dry_run: bool,
}

impl ApplyArgs {
    fn policy(&self) -> CollisionPolicy {
        if self.keep_bumped {
            CollisionPolicy::KeepBumped
        } else {
            CollisionPolicy::Stop
        }
    }
}

/// Axes taking part in spec identity.
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Ignore the OS family
    #[arg(long)]
    any_os: bool,

    /// Ignore the OS version
    #[arg(long)]
    any_version: bool,

    /// Ignore the architecture
    #[arg(long)]
    any_arch: bool,

    /// Ignore the provider
    #[arg(long)]
    any_provider: bool,

    /// Compare build specs by JDK instead of by project
    #[arg(long)]
    by_jdk: bool,

    /// Ignore every variant category
    #[arg(long, conflicts_with = "variants")]
    any_variants: bool,

    /// Compare only these variant categories (comma-separated)
    #[arg(long, value_delimiter = ',')]
    variants: Option<Vec<String>>,
}

impl FilterArgs {
    fn to_filter(&self) -> EqualityFilter {
        let mut filter = EqualityFilter::exact();
        filter.os = !self.any_os;
        filter.version = !self.any_version;
        filter.arch = !self.any_arch;
        if self.any_provider {
            filter = filter.without_provider();
        }
        if self.by_jdk {
            filter = filter.by_jdk();
        }
        if self.any_variants {
            filter = filter.without_variants();
        } else if let Some(categories) = &self.variants {
            filter = filter.with_variants(categories.iter().cloned());
        }
        filter
    }
}

#[derive(Args, Debug)]
struct MatrixArgs {
    /// Axis laid out on rows; the other one goes on columns
    #[arg(long, value_enum, default_value_t = Axis::Build)]
    rows: Axis,

    /// Drop rows and columns that hold no job
    #[arg(long)]
    prune: bool,

    // Equality filter of the build axis.
    #[command(flatten)]
    builds: FilterArgs,

    /// Ignore the provider on the test axis
    #[arg(long)]
    tests_any_provider: bool,

    /// Ignore test variants on the test axis
    #[arg(long)]
    tests_any_variants: bool,

    /// Keep build specs whose canonical string matches this pattern
    #[arg(long)]
    include_builds: Option<String>,

    /// Keep test specs whose canonical string matches this pattern
    #[arg(long)]
    include_tests: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Axis {
    Build,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scope {
    Both,
    BuildOnly,
    TestOnly,
}

impl From<Scope> for BumpScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Both => BumpScope::Both,
            Scope::BuildOnly => BumpScope::BuildOnly,
            Scope::TestOnly => BumpScope::TestOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli).await?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(settings.json_logs, level);

    let ctx = RunContext::from_settings(settings)
        .await
        .context("Failed to load configuration")?;
    let run_id = ctx.run_id();
    let _span = RunSpan::enter(&run_id);
    info!(
        config_root = %ctx.settings.config_root.display(),
        projects = ctx.cache.projects().len(),
        "configuration loaded"
    );

    let format = cli.format;
    match cli.command {
        Commands::Specs {
            axis,
            filter,
            include,
        } => cmd_specs(&ctx, axis, &filter, include.as_deref(), format),
        Commands::Matrix(args) => cmd_matrix(&ctx, &args, format),
        Commands::Jobs { project } => cmd_jobs(&ctx, project.as_deref(), format),
        Commands::Reconcile { dry_run } => cmd_reconcile(&ctx, dry_run, format).await,
        Commands::Bump { target } => {
            let (modifier, apply) = bump_modifier(&ctx, target)?;
            cmd_modify(&ctx, modifier.as_ref(), apply, Vec::new(), format).await
        }
        Commands::RemoveVariant {
            variant,
            artifact_labels,
            apply,
        } => {
            let variant = ctx
                .cache
                .task_variant(&variant)
                .cloned()
                .with_context(|| format!("Unknown task variant: {}", variant))?;
            let remover = VariantRemover::new(variant);
            let labels = relabel_artifacts(&ctx, &remover, &artifact_labels);
            cmd_modify(&ctx, &remover, apply, labels, format).await
        }
    }
}

/// Settings file (or defaults), then command-line overrides.
async fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .await
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => Settings::default(),
    };
    if let Some(root) = &cli.config_root {
        settings.config_root = root.clone();
    }
    if let Some(root) = &cli.jobs_root {
        settings.jobs_root = root.clone();
    }
    if let Some(root) = &cli.archive_root {
        settings.archive_root = root.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency = concurrency.max(1);
    }
    if cli.json {
        settings.json_logs = true;
    }
    Ok(settings)
}

fn emit<T: Serialize>(format: Format, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Text => print!("{}", text(value)),
    }
    Ok(())
}

fn spec_query(filter: EqualityFilter, include: Option<&str>) -> Result<SpecQuery, EnumerationError> {
    let query = SpecQuery::new(filter);
    match include {
        Some(pattern) => query.including(pattern),
        None => Ok(query),
    }
}

fn canonical_lines<S: Spec>(specs: &[S]) -> String {
    specs
        .iter()
        .map(|spec| format!("{}\n", spec.canonical()))
        .collect()
}

fn cmd_specs(
    ctx: &RunContext,
    axis: Axis,
    filter: &FilterArgs,
    include: Option<&str>,
    format: Format,
) -> Result<()> {
    let query = spec_query(filter.to_filter(), include)?;
    let enumerator = Enumerator::new(&ctx.cache);
    match axis {
        Axis::Build => {
            let specs = enumerator.build_specs(&query)?;
            emit(format, &specs, |specs| canonical_lines(specs))
        }
        Axis::Test => {
            let specs = enumerator.test_specs(&query)?;
            emit(format, &specs, |specs| canonical_lines(specs))
        }
    }
}

fn cmd_matrix(ctx: &RunContext, args: &MatrixArgs, format: Format) -> Result<()> {
    let jobs = generate_all(&ConfigTreeGenerator, &ctx.cache)?;
    let enumerator = Enumerator::new(&ctx.cache);

    let build_query = spec_query(args.builds.to_filter(), args.include_builds.as_deref())?;
    let builds = AxisSpecs::Builds(enumerator.build_specs(&build_query)?);

    let mut test_filter = EqualityFilter::exact();
    if args.tests_any_provider {
        test_filter = test_filter.without_provider();
    }
    if args.tests_any_variants {
        test_filter = test_filter.without_variants();
    }
    let test_query = spec_query(test_filter, args.include_tests.as_deref())?;
    let tests = AxisSpecs::Tests(enumerator.test_specs(&test_query)?);

    let (rows, columns) = match args.rows {
        Axis::Build => (&builds, &tests),
        Axis::Test => (&tests, &builds),
    };
    let matrix = MatrixBuilder::new(&ctx.cache, &jobs).build(rows, columns, args.prune)?;
    emit(format, &matrix, render_plain)
}

fn cmd_jobs(ctx: &RunContext, project: Option<&str>, format: Format) -> Result<()> {
    let jobs: Vec<Job> = generate_all(&ConfigTreeGenerator, &ctx.cache)?
        .into_iter()
        .filter(|job| project.map_or(true, |p| job.project_id() == p))
        .collect();
    emit(format, &jobs, |jobs| {
        jobs.iter().map(|job| format!("{}\n", job.name())).collect()
    })
}

async fn cmd_reconcile(ctx: &RunContext, dry_run: bool, format: Format) -> Result<()> {
    let jobs = generate_all(&ConfigTreeGenerator, &ctx.cache)?;
    let store = open_store(&ctx.settings).await?;
    let report = reconcile_jobs(ctx, &store, &jobs, dry_run).await?;
    emit(format, &report, report_text)?;
    ensure_applied(&report)
}

/// Build the modifier a `bump` subcommand names.
fn bump_modifier(
    ctx: &RunContext,
    target: BumpTarget,
) -> Result<(Box<dyn JobModifier>, ApplyArgs)> {
    let platform = |id: &str| {
        ctx.cache
            .platform(id)
            .cloned()
            .with_context(|| format!("Unknown platform: {}", id))
    };
    let name_filter = |pattern: Option<String>| {
        pattern
            .map(|p| Regex::new(&p).with_context(|| format!("Invalid --filter pattern: {}", p)))
            .transpose()
    };

    match target {
        BumpTarget::Platform {
            from,
            to,
            scope,
            filter,
            apply,
        } => {
            let mut bumper = PlatformBumper::new(platform(&from)?, platform(&to)?, scope.into());
            if let Some(regex) = name_filter(filter)? {
                bumper = bumper.with_filter(regex);
            }
            Ok((Box::new(bumper), apply))
        }
        BumpTarget::Product {
            from,
            to,
            package,
            apply,
        } => {
            let from = ctx
                .cache
                .projects()
                .iter()
                .map(|project| project.product())
                .find(|product| product.jdk == from)
                .cloned()
                .with_context(|| format!("No project uses product {}", from))?;
            let to = Product {
                jdk: to,
                package_name: package.unwrap_or_else(|| from.package_name.clone()),
            };
            Ok((Box::new(ProductBumper::new(from, to)), apply))
        }
        BumpTarget::Provider {
            from,
            to,
            scope,
            filter,
            apply,
        } => {
            if ctx.cache.provider(&to).is_none() {
                anyhow::bail!("Unknown provider: {}", to);
            }
            let mut bumper = ProviderBumper::new(from, to, scope.into());
            if let Some(regex) = name_filter(filter)? {
                bumper = bumper.with_filter(regex);
            }
            Ok((Box::new(bumper), apply))
        }
    }
}

#[derive(Serialize)]
struct ModifyReport<'a> {
    bump: &'a BumpOutcome,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    artifact_labels: &'a [LabelRewrite],
    reconcile: &'a ReconcileReport,
}

/// An archived build-artifact label and what a variant removal makes of it.
#[derive(Debug, Serialize)]
struct LabelRewrite {
    label: String,
    /// `None` when the label carries no value of the removed category.
    rewritten: Option<String>,
}

fn relabel_artifacts(
    ctx: &RunContext,
    remover: &VariantRemover,
    labels: &[String],
) -> Vec<LabelRewrite> {
    let build_categories: Vec<TaskVariant> = ctx
        .cache
        .task_variants()
        .iter()
        .filter(|v| v.kind == TaskKind::Build)
        .cloned()
        .collect();
    labels
        .iter()
        .map(|label| LabelRewrite {
            label: label.clone(),
            rewritten: remover.strip_artifact_label(label, &build_categories),
        })
        .collect()
}

/// Apply `modifier` to the jobs active in the store and reconcile the store
/// with the result. The configuration tree itself is left as it is.
async fn cmd_modify(
    ctx: &RunContext,
    modifier: &dyn JobModifier,
    apply: ApplyArgs,
    labels: Vec<LabelRewrite>,
    format: Format,
) -> Result<()> {
    let store = open_store(&ctx.settings).await?;
    let deployed = DeployedJobs::load(&store, &JsonJobRenderer)
        .await
        .context("Failed to list the job store")?;
    if !deployed.unreadable.is_empty() {
        let names: Vec<&str> = deployed.unreadable.keys().map(String::as_str).collect();
        anyhow::bail!(
            "{} stored job(s) cannot be read back as jobs: {}",
            names.len(),
            names.join(", ")
        );
    }

    let outcome = bump(modifier, &deployed.jobs, apply.policy())
        .with_context(|| format!("{} aborted", modifier.describe()))?;
    info!(
        modifier = %modifier.describe(),
        applied = outcome.applied.len(),
        collisions = outcome.collisions.len(),
        "jobs modified"
    );

    let report = reconcile_jobs(ctx, &store, outcome.desired_jobs(), apply.dry_run).await?;
    emit(
        format,
        &ModifyReport {
            bump: &outcome,
            artifact_labels: &labels,
            reconcile: &report,
        },
        |r| {
            format!(
                "{}{}{}",
                bump_text(r.bump),
                labels_text(r.artifact_labels),
                report_text(r.reconcile)
            )
        },
    )?;
    ensure_applied(&report)
}

async fn open_store(settings: &Settings) -> Result<FsJobStore> {
    FsJobStore::open(&settings.jobs_root, &settings.archive_root)
        .await
        .with_context(|| format!("Failed to open job store at {:?}", settings.jobs_root))
}

async fn reconcile_jobs(
    ctx: &RunContext,
    store: &FsJobStore,
    desired: &[Job],
    dry_run: bool,
) -> Result<ReconcileReport> {
    let settings = &ctx.settings;
    let notifier = settings
        .notify_command
        .clone()
        .map(|command| {
            CommandNotifier::new(command, Duration::from_secs(settings.notify_timeout_secs))
        })
        .transpose()
        .context("Invalid notify command")?;

    let renderer = JsonJobRenderer;
    let mut reconciler = Reconciler::new(store, &renderer)
        .with_concurrency(settings.concurrency)
        .with_run_id(ctx.run_id());
    if let Some(notifier) = &notifier {
        reconciler = reconciler.with_notifier(notifier);
    }

    let report = reconciler
        .reconcile(desired, dry_run)
        .await
        .context("Reconciliation did not start")?;
    Ok(report)
}

fn ensure_applied(report: &ReconcileReport) -> Result<()> {
    let failed = report.results.failures().count();
    if failed > 0 {
        anyhow::bail!("{} job update(s) failed", failed);
    }
    Ok(())
}

fn report_text(report: &ReconcileReport) -> String {
    let mut out = String::new();
    for skipped in &report.plan.unreadable {
        out.push_str(&format!(
            "{:<8} {} (FAILED: {})\n",
            skipped.action.as_str(),
            skipped.job_name,
            skipped.message
        ));
    }
    for planned in &report.plan.actions {
        let status = match report.results.for_job(&planned.job_name) {
            None => "planned".to_string(),
            Some(result) if result.success => result.message.clone(),
            Some(result) => format!("FAILED: {}", result.message),
        };
        out.push_str(&format!(
            "{:<8} {} ({})\n",
            planned.action.as_str(),
            planned.job_name,
            status
        ));
    }
    out.push_str(&format!(
        "{} action(s), {} unchanged{}\n",
        report.plan.actions.len(),
        report.plan.unchanged.len(),
        if report.dry_run { " [dry run]" } else { "" }
    ));
    out
}

fn labels_text(labels: &[LabelRewrite]) -> String {
    labels
        .iter()
        .map(|l| match &l.rewritten {
            Some(new) => format!("artifact {} -> {}\n", l.label, new),
            None => format!("artifact {} (unchanged)\n", l.label),
        })
        .collect()
}

fn bump_text(outcome: &BumpOutcome) -> String {
    let mut out = String::new();
    for modification in &outcome.applied {
        match modification.rename() {
            Some((old, new)) => out.push_str(&format!("{} -> {}\n", old, new)),
            None => out.push_str(&format!("{} (unchanged name)\n", modification.original.name())),
        }
    }
    for collision in &outcome.collisions {
        out.push_str(&format!(
            "collision: {} -> {} (taken by {})\n",
            collision.original,
            collision.bumped,
            collision.conflicts_with.join(", ")
        ));
    }
    out
}
