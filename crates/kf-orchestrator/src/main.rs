//! kube-forge Orchestrator Daemon
//!
//! Serves the cluster lifecycle API and runs provisioning steps in the
//! background.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kf_core::config::{self, OrchestratorConfig};
use kf_core::store::{MemoryStore, RecordStore};
use kf_orchestrator::command::ProcessRunner;
use kf_orchestrator::workspace::WorkspaceManager;
use kf_orchestrator::{http, ClusterService, OrchestratorState};

#[derive(Parser)]
#[command(name = "kf-orchestrator")]
#[command(about = "kube-forge cluster lifecycle orchestrator")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Base directory for templates and workspaces (overrides config)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Run in foreground with verbose output
    #[arg(short, long)]
    foreground: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.foreground { "debug" } else { &args.log_level };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("kube-forge orchestrator starting...");

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                OrchestratorConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            OrchestratorConfig::default()
        }
    };

    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(base_dir) = args.base_dir {
        // A snapshot living under the old base directory moves with it
        let relocated = config
            .state_file
            .as_ref()
            .and_then(|path| path.strip_prefix(&config.base_dir).ok())
            .map(|relative| base_dir.join(relative));
        if relocated.is_some() {
            config.state_file = relocated;
        }
        config.base_dir = base_dir;
    }
    config.validate().context("Invalid configuration")?;

    // Open the record store
    let store: Arc<dyn RecordStore> = match &config.state_file {
        Some(path) => Arc::new(
            MemoryStore::open(path)
                .await
                .with_context(|| format!("Failed to open record snapshot {:?}", path))?,
        ),
        None => {
            tracing::warn!("No state_file configured, records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    report_interrupted_runs(store.as_ref()).await;

    let workspaces = WorkspaceManager::from_config(&config);
    let clusters = ClusterService::new(&config, store, Arc::new(ProcessRunner::new()), workspaces);
    let state = Arc::new(OrchestratorState::new(config.clone(), clusters.clone()));

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    http::serve(state, &config.bind_address, cancel)
        .await
        .with_context(|| format!("HTTP server on {} failed", config.bind_address))?;

    let running = clusters.running_tasks();
    if running > 0 {
        tracing::warn!(
            "Shutting down with {} lifecycle run(s) in flight; their outcome will not be recorded",
            running
        );
    }

    tracing::info!("Orchestrator shutdown complete");
    Ok(())
}

/// Runs cut short by a previous shutdown are not resumed
async fn report_interrupted_runs(store: &dyn RecordStore) {
    match store.clusters().await {
        Ok(clusters) => {
            for cluster in clusters.iter().filter(|c| c.status.is_in_progress()) {
                tracing::warn!(
                    "Cluster {} was left in {} by a previous run and will not be resumed",
                    cluster.key(),
                    cluster.status
                );
            }
        }
        Err(e) => tracing::warn!("Failed to list clusters: {}", e),
    }
}
