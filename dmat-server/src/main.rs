//! dmat-server - Digital maturity assessment backend
//!
//! Serves the assessment REST API and, on first start against an empty
//! database, imports the source workbooks.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dmat_common::config::{self, TomlConfig};
use dmat_common::db::init_database;
use dmat_server::db::areas;
use dmat_server::import::{self, ImportSources};
use dmat_server::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for dmat-server
#[derive(Parser, Debug)]
#[command(name = "dmat-server")]
#[command(about = "Digital maturity assessment backend")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "DMAT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "DMAT_DATABASE")]
    database: Option<PathBuf>,

    /// Port to listen on (overrides config and DMAT_PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read first so its log level can seed the filter
    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting dmat-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = config::resolve_database_path(args.database.as_deref(), &config);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let sources = ImportSources::from_config(&config).context("Invalid sheet layout configuration")?;

    if config.auto_import && areas::count_areas(&pool).await? == 0 {
        if sources.all_present() {
            info!("Database has no areas, importing source workbooks");
            let report = import::run_all(&pool, &sources).await;
            info!(status = %report.status, "{}", report.message);
            for error in &report.errors {
                warn!("{}", error);
            }
        } else {
            warn!(
                "Database has no areas and source workbooks are missing ({}, {})",
                sources.checksheet_workbook.display(),
                sources.maturity_workbook.display()
            );
        }
    }

    let state = AppState::new(pool, sources);
    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.effective_port());
    let addr = format!("{}:{}", config.bind_address, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("dmat-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
