//! # uplink
//!
//! Server binary for the connection-status event store. Wires settings,
//! the `SQLite` pool, the store, and the HTTP surface together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uplink_events::sqlite::connection::{self, ConnectionConfig, ConnectionPool};
use uplink_events::sqlite::migrations::run_migrations;
use uplink_events::{EventStore, PageLimits};
use uplink_server::AppState;
use uplink_settings::UplinkSettings;

/// Connection-status event store.
#[derive(Parser, Debug)]
#[command(name = "uplink", version, about = "Connection-status event store")]
struct Cli {
    /// Path to the settings JSON file.
    #[arg(long, global = true, default_value = "uplink.settings.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Override the database path from settings.
        #[arg(long)]
        db: Option<PathBuf>,

        /// Override the bind address from settings.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Bootstrap or upgrade the database schema and exit.
    Migrate {
        /// Override the database path from settings.
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing(filter: &str) {
    // UPLINK_LOG already overrode settings.logging.filter during load, so a
    // single directive string is authoritative here.
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn connection_config(settings: &UplinkSettings) -> ConnectionConfig {
    ConnectionConfig {
        pool_size: settings.storage.pool_size,
        acquire_timeout: Duration::from_millis(settings.storage.acquire_timeout_ms),
        busy_timeout: Duration::from_millis(settings.storage.busy_timeout_ms),
    }
}

fn open_database(db_path: &Path, settings: &UplinkSettings) -> Result<ConnectionPool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    let pool = connection::new_pool(db_path, &connection_config(settings))
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    {
        let conn = pool.get().context("failed to get database connection")?;
        run_migrations(&conn).context("failed to run migrations")?;
    }
    Ok(pool)
}

async fn serve(settings: UplinkSettings, db: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let db_path = db.unwrap_or_else(|| PathBuf::from(&settings.storage.db_path));
    let bind = bind.unwrap_or_else(|| settings.server.bind.clone());

    let pool = open_database(&db_path, &settings)?;
    let store = EventStore::new(pool).with_limits(PageLimits {
        default_page_size: settings.query.default_page_size,
        max_page_size: settings.query.max_page_size,
    });

    let metrics_handle = uplink_server::metrics::install_recorder();
    let state = AppState::new(
        Arc::new(store),
        Arc::new(settings),
        Some(metrics_handle),
    );
    let router = uplink_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, db = %db_path.display(), "uplink listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = uplink_settings::load_settings_from_path(&args.settings)
        .with_context(|| format!("failed to load settings {}", args.settings.display()))?;
    init_tracing(&settings.logging.filter);

    match args.command {
        Command::Serve { db, bind } => serve(settings, db, bind).await,
        Command::Migrate { db } => {
            let db_path = db.unwrap_or_else(|| PathBuf::from(&settings.storage.db_path));
            let _ = open_database(&db_path, &settings)?;
            info!(db = %db_path.display(), "schema is up to date");
            Ok(())
        }
    }
}
