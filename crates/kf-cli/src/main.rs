//! kube-forge CLI
//!
//! Client for the kube-forge orchestrator: create, resize, inspect and
//! delete clusters, and fetch control-plane tokens.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kube_forge::client::{ApiClient, DEFAULT_SERVER};
use kube_forge::commands;

#[derive(Parser)]
#[command(name = "kube-forge")]
#[command(author, version, about = "Kubernetes cluster lifecycle orchestrator client")]
#[command(propagate_version = true)]
struct Cli {
    /// Orchestrator base URL
    #[arg(short, long, global = true, env = "KUBE_FORGE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the orchestrator and its provisioning engine are working
    Ping,

    /// List clusters
    List {
        /// Only show clusters in this status (e.g. CREATED, ERROR)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show one cluster
    Get {
        /// Cloud provider (aws, azure, google)
        provider: String,
        region: String,
        name: String,
    },

    /// Create a cluster from a spec file
    Create {
        /// Cluster spec (.toml or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Change the node-group scale bounds of a created cluster
    Resize {
        /// Node-group spec (.toml or .json)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Tear a cluster down and delete its records
    Delete {
        /// Cloud provider (aws, azure, google)
        provider: String,
        region: String,
        name: String,
    },

    /// Print a control-plane access token for a cluster
    Token {
        /// Cloud provider (aws, azure, google)
        provider: String,
        region: String,
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let client = ApiClient::new(&cli.server);

    match cli.command {
        Commands::Ping => commands::ping_command(&client).await,
        Commands::List { status } => commands::list_command(&client, status.as_deref()).await,
        Commands::Get {
            provider,
            region,
            name,
        } => {
            let key = commands::cluster_key(&provider, &region, &name)?;
            commands::get_command(&client, &key).await
        }
        Commands::Create { file } => commands::create_command(&client, &file).await,
        Commands::Resize { file } => commands::resize_command(&client, &file).await,
        Commands::Delete {
            provider,
            region,
            name,
        } => {
            let key = commands::cluster_key(&provider, &region, &name)?;
            commands::delete_command(&client, &key).await
        }
        Commands::Token {
            provider,
            region,
            name,
        } => {
            let key = commands::cluster_key(&provider, &region, &name)?;
            commands::token_command(&client, &key).await
        }
    }
}
