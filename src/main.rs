//! Main entry point for the scenario-ranker command line tool
//!
//! Loads configuration and a dataset, then either applies completed fixtures
//! or projects a focal team's rank over pending fixtures, printing JSON.

use anyhow::{anyhow, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use scenario_ranker::config::AppConfig;
use scenario_ranker::projection::{self, EnumerationMode, PoolFilter};
use scenario_ranker::{
    Dataset, PendingFixture, ProjectionRequest, ScenarioEnumerator, SequentialUpdater,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info};

/// Scenario Ranker - Elo ratings and rank projection over pending fixtures
#[derive(Parser)]
#[command(
    name = "scenario-ranker",
    version,
    about = "Apply fixture results to Elo ratings and project rank scenarios",
    long_about = "Scenario Ranker applies completed international fixtures to team ratings in \
                 chronological order and enumerates the outcomes of pending fixtures to project \
                 how a focal team's rank can move."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Worker thread override
    #[arg(long, value_name = "N", help = "Override scenario worker threads")]
    workers: Option<usize>,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every completed fixture and print the new ratings with deltas
    Apply(ApplyArgs),
    /// Project a focal team's rank over the pending fixtures
    Project(ProjectArgs),
}

#[derive(ClapArgs)]
struct ApplyArgs {
    /// Dataset file (JSON with entities and fixtures)
    #[arg(short, long, value_name = "FILE")]
    data: PathBuf,

    /// Write JSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(ClapArgs)]
struct ProjectArgs {
    /// Dataset file (JSON with entities and fixtures)
    #[arg(short, long, value_name = "FILE")]
    data: PathBuf,

    /// Focal team id
    #[arg(short, long, value_name = "ID")]
    focal: String,

    /// Enumerate every scenario (the default)
    #[arg(long, conflicts_with = "samples")]
    exhaustive: bool,

    /// Sample this many scenarios instead of enumerating all of them
    #[arg(long, value_name = "N")]
    samples: Option<u64>,

    /// Sampling seed override
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Split wins into goal-margin buckets up to this margin
    #[arg(long, value_name = "MAX")]
    margins: Option<u32>,

    /// Rank only within this confederation
    #[arg(long, value_name = "NAME")]
    confederation: Option<String>,

    /// Cancel evaluation after this many seconds and report the partial result
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Write JSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply command line overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if let Some(workers) = args.workers {
        config.engine.workers = workers;
    }

    scenario_ranker::config::validate_config(&config)?;
    Ok(config)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| anyhow!("Failed to write output {:?}: {}", path, e))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_apply(config: &AppConfig, args: &ApplyArgs) -> Result<()> {
    let dataset = Dataset::from_file(&args.data)?;
    let updater = SequentialUpdater::from_config(&config.engine)?;

    let completed = dataset.completed();
    let outcome = updater.apply(&dataset.baseline()?, &completed)?;
    info!(
        "Applied {} fixtures, snapshot version {}",
        outcome.deltas.len(),
        outcome.snapshot.version()
    );

    write_json(&outcome, args.output.as_deref())
}

async fn run_project(config: &AppConfig, args: &ProjectArgs) -> Result<()> {
    let dataset = Dataset::from_file(&args.data)?;
    let enumerator = Arc::new(ScenarioEnumerator::from_config(&config.engine)?);

    // Project from current ratings: completed fixtures first
    let current = enumerator
        .updater()
        .apply(&dataset.baseline()?, &dataset.completed())?
        .snapshot;

    let pending: Vec<PendingFixture> = dataset
        .pending()
        .into_iter()
        .map(|fixture| match args.margins {
            Some(max_margin) => PendingFixture::new(fixture).with_margins(max_margin),
            None => PendingFixture::new(fixture),
        })
        .collect();

    let mut request = ProjectionRequest::new(args.focal.clone());
    if let Some(confederation) = &args.confederation {
        request = request.with_pool(PoolFilter::Confederation(confederation.clone()));
    }
    if args.exhaustive {
        request.mode = EnumerationMode::Exhaustive;
    } else if let Some(samples) = args.samples {
        request = request.sampled(samples);
    }
    if let Some(seed) = args.seed {
        request = request.with_seed(seed);
    }

    let report = match args.timeout_secs {
        Some(secs) => {
            projection::run_with_timeout(
                enumerator,
                current,
                pending,
                request,
                Duration::from_secs(secs),
            )
            .await?
        }
        None => enumerator.project(&current, &pending, &request)?,
    };

    info!(
        "{}: rank {} now, {}..{} projected (expected {:.2}) over {} scenarios",
        report.focal_id,
        report.baseline_rank,
        report.min_rank,
        report.max_rank,
        report.expected_rank,
        report.scenarios_evaluated
    );

    write_json(&report, args.output.as_deref())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;
    init_logging(&config.service.log_level)?;

    info!(
        "Starting {} v{}",
        config.service.name,
        scenario_ranker::VERSION
    );

    if args.dry_run {
        info!("✅ Configuration is valid (dry run)");
        return Ok(());
    }

    let result = match &args.command {
        Some(Command::Apply(apply)) => run_apply(&config, apply),
        Some(Command::Project(project)) => run_project(&config, project).await,
        None => Err(anyhow!("No command given; use `apply` or `project`")),
    };

    if let Err(e) = &result {
        error!("❌ {}", e);
    }
    result
}
