//! possync integration worker.
//!
//! Main entry point that loads configuration, wires the file-backed
//! stores into a worker and drives it until SIGINT/SIGTERM.

use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use possync_core::config::AppConfig;
use possync_core::error::AppError;
use possync_worker::{Worker, WorkerRunner};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Worker error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("POSSYNC_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("POSSYNC_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Run the worker until a shutdown signal arrives
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting possync worker v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Events: '{}', jobs: '{}', outbox: '{}'",
        config.paths.events_log,
        config.paths.jobs_file,
        config.paths.outbox_dir
    );

    create_data_directories(&config).await?;

    let worker = Worker::from_config(&config);
    let runner = WorkerRunner::new(
        worker,
        Duration::from_secs(config.worker.poll_interval_seconds),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(runner.run(shutdown_rx));

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, finishing the current tick...");
    let _ = shutdown_tx.send(true);

    handle
        .await
        .map_err(|e| AppError::internal(format!("Worker task failed: {}", e)))?;

    tracing::info!("possync worker shut down gracefully");
    Ok(())
}

/// Create the parent directories of every file the worker writes
async fn create_data_directories(config: &AppConfig) -> Result<(), AppError> {
    let files = [&config.paths.jobs_file, &config.paths.state_file];

    let mut dirs: Vec<&std::path::Path> = files
        .iter()
        .filter_map(|f| std::path::Path::new(f.as_str()).parent())
        .filter(|d| !d.as_os_str().is_empty())
        .collect();
    dirs.push(std::path::Path::new(&config.paths.outbox_dir));

    for dir in dirs {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::internal(format!(
                "Failed to create dir '{}': {}",
                dir.display(),
                e
            ))
        })?;
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
