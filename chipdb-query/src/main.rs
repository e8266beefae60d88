//! chipdb-query - read-only HTTP query service
//!
//! Serves the component store populated by chipdb-ingest as JSON.

use anyhow::{Context, Result};
use chipdb_common::config::{load_toml_config, resolve_database_path, DEFAULT_LISTEN_ADDR};
use chipdb_query::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Serve the component report over HTTP
#[derive(Parser, Debug)]
#[command(name = "chipdb-query", version)]
struct Args {
    /// Component store file (overrides CHIPDB_DATABASE and the config file)
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Bind address
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        "Starting chipdb-query v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = load_toml_config().context("Failed to load configuration")?;
    let db_path = resolve_database_path(args.database.as_deref(), &config);
    info!("Component store: {}", db_path.display());
    if !db_path.exists() {
        warn!("Store does not exist yet; /report answers 500 until chipdb-ingest has run");
    }

    let listen = args
        .listen
        .or(config.listen)
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

    let app = build_router(AppState::new(db_path));

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;
    info!("chipdb-query listening on http://{}", listen);
    info!("Report: http://{}/report", listen);

    axum::serve(listener, app).await?;

    Ok(())
}
