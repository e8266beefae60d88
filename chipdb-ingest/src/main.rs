//! chipdb-ingest - batch HDL ingestion
//!
//! Resets the component store, classifies every given source file in
//! parallel into it, then prints the optimization suggestions and the full
//! component report to stdout. Diagnostics go to stderr.

use anyhow::{Context, Result};
use chipdb_common::config::{load_toml_config, resolve_database_path};
use chipdb_common::report::{optimize, render_advisories, render_report, report};
use chipdb_common::ComponentStore;
use chipdb_ingest::{IngestOptions, IngestPipeline};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Classify HDL source lines into the component store
#[derive(Parser, Debug)]
#[command(name = "chipdb-ingest", version)]
struct Args {
    /// Component store file (overrides CHIPDB_DATABASE and the config file)
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Give up on a file whose pass runs longer than this many seconds
    #[arg(long, value_name = "SECS", env = "CHIPDB_FILE_TIMEOUT_SECS")]
    file_timeout_secs: Option<u64>,

    /// HDL source files to ingest
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if args.files.is_empty() {
        eprintln!("Usage: chipdb-ingest <file1.v> <file2.v> ...");
        return Ok(ExitCode::from(1));
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting chipdb-ingest v{}", env!("CARGO_PKG_VERSION"));

    let config = load_toml_config().context("Failed to load configuration")?;
    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Component store: {}", db_path.display());

    let store = ComponentStore::open(&db_path)
        .await
        .context("Failed to open component store")?;

    // Reset strictly before any worker starts
    store
        .reset()
        .await
        .context("Failed to reset component store")?;

    let options = IngestOptions {
        file_timeout: args
            .file_timeout_secs
            .or(config.file_timeout_secs)
            .map(Duration::from_secs),
    };

    let summary = IngestPipeline::with_options(store.clone(), options)
        .run(&args.files)
        .await;

    for file in &summary.files {
        match &file.failure {
            None => info!(
                path = %file.path.display(),
                appended = file.appended,
                unrecognized = file.unrecognized.len(),
                "File ingested"
            ),
            Some(failure) => warn!(
                path = %file.path.display(),
                appended = file.appended,
                unrecognized = file.unrecognized.len(),
                "File not fully ingested: {}",
                failure
            ),
        }
    }

    // Both passes are best-effort: they show whatever made it into the store
    match optimize(&store).await {
        Ok(advisories) => print!("{}", render_advisories(&advisories)),
        Err(e) => error!("Optimization pass failed: {}", e),
    }

    match report(&store).await {
        Ok(rows) => print!("{}", render_report(&rows)),
        Err(e) => error!("Report generation failed: {}", e),
    }

    store.close().await;
    Ok(ExitCode::SUCCESS)
}
