//! dmat-import - load the source workbooks without starting the server
//!
//! Exits with status 1 when any requested load fails.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dmat_common::config::{self, TomlConfig};
use dmat_common::db::init_database;
use dmat_server::import::{self, ImportKind, ImportOutcome, ImportSources};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Reports,
    RatingScales,
    Checksheet,
    DimensionChecksheet,
    All,
}

impl Target {
    fn kind(self) -> Option<ImportKind> {
        match self {
            Target::Reports => Some(ImportKind::Reports),
            Target::RatingScales => Some(ImportKind::RatingScales),
            Target::Checksheet => Some(ImportKind::Checksheet),
            Target::DimensionChecksheet => Some(ImportKind::DimensionChecksheet),
            Target::All => None,
        }
    }
}

/// Import maturity workbooks into the database
#[derive(Parser, Debug)]
#[command(name = "dmat-import")]
#[command(version)]
struct Args {
    /// What to load
    #[arg(value_enum)]
    target: Target,

    /// TOML config file
    #[arg(short, long, env = "DMAT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "DMAT_DATABASE")]
    database: Option<PathBuf>,

    /// Print every row-level warning
    #[arg(short, long)]
    verbose: bool,
}

fn print_outcome(key: &str, outcome: &ImportOutcome, verbose: bool) {
    println!("[{}] {:?}: {}", key, outcome.status, outcome.message);

    let Some(summary) = &outcome.summary else {
        return;
    };

    println!(
        "    written {}, removed {}, skipped {}, warnings {}",
        summary.records_written,
        summary.removed,
        summary.skipped,
        summary.warnings.len()
    );
    for (level, count) in &summary.per_level {
        println!("    level {}: {}", level, count);
    }
    for (group, count) in &summary.per_group {
        println!("    {}: {}", group, count);
    }
    if verbose {
        for warning in &summary.warnings {
            println!("    warning: {}", warning);
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let db_path = config::resolve_database_path(args.database.as_deref(), &config);
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let sources = ImportSources::from_config(&config).context("Invalid sheet layout configuration")?;

    let ok = match args.target.kind() {
        Some(kind) => {
            let outcome = import::run_import(&pool, &sources, kind).await;
            print_outcome(kind.key(), &outcome, args.verbose);
            outcome.is_success()
        }
        None => {
            let report = import::run_all(&pool, &sources).await;
            for (key, outcome) in &report.results {
                print_outcome(key, outcome, args.verbose);
            }
            println!("{}", report.message);
            report.is_success()
        }
    };

    pool.close().await;
    Ok(ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
