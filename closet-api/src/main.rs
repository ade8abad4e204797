//! closet-api - wardrobe catalogue and outfit suggestion service
//!
//! Stores clothing photos per user, classifies them with a vision model
//! when one is configured, and suggests outfits from the catalogue.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use closet_common::config::{LoggingConfig, RootFolderInitializer, RootFolderResolver, TomlConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use closet_api::storage::ItemStorage;
use closet_api::vision::build_classifier;
use closet_api::AppState;

const MODULE_NAME: &str = "closet-api";

/// Command-line arguments for closet-api
#[derive(Parser, Debug)]
#[command(name = "closet-api")]
#[command(about = "Wardrobe catalogue and outfit suggestion service")]
#[command(version)]
struct Args {
    /// Root folder holding the database and stored images
    #[arg(short, long, env = "CLOSET_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CLOSET_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Install the global subscriber; RUST_LOG overrides the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},closet_api={level},tower_http={level}",
            level = logging.level
        ))
    });

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = RootFolderResolver::new(MODULE_NAME).with_cli_arg(args.root_folder.clone());
    let config_path = args.config.clone().or_else(|| resolver.config_path());
    let config = TomlConfig::load_or_default(config_path.as_deref());

    init_tracing(&config.logging)?;

    info!("Starting closet-api v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    // Step 1: Resolve root folder
    let root_folder = resolver.with_toml_root(config.root_folder.clone()).resolve();
    info!("Root folder: {}", root_folder.display());

    // Step 2: Create root and storage directories if missing
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    // Step 3: Open or create database
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = closet_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;

    // Step 4: Collaborators
    let storage = ItemStorage::new(initializer.storage_path());
    let classifier = build_classifier(&config.vision, config.resolved_api_key());

    let state = AppState::new(db_pool, storage)
        .with_classifier(classifier)
        .with_auto_classify(config.vision.auto_classify_on_upload)
        .with_cors_origins(config.cors_origins.clone());

    let app = closet_api::build_router(state);

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
