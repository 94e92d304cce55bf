//! Sidecache CLI - command-line interface to the offline interception agent.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use sidecache::agent::Agent;
use sidecache::config::AgentConfig;
use sidecache::store::DiskStore;

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "sidecache")]
#[command(version = sidecache::VERSION)]
#[command(about = "Offline-first request cache agent", long_about = None)]
struct Cli {
    /// Path to the INI configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the cache version tag
    #[arg(long, global = true)]
    cache_version: Option<String>,

    /// Override the disk store directory
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Origin used to resolve relative URLs (e.g. https://fishlog.example)
    #[arg(long, global = true)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Warm the store from the preload manifest and activate the current version
    Warm,
    /// Resolve one request through the strategy engine and print the response
    Fetch {
        /// Request URL (absolute, or relative to --origin)
        url: String,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Request body
        #[arg(long)]
        body: Option<String>,
    },
    /// Clear the current store partition
    Clear,
}

fn load_config(cli: &Cli) -> Result<AgentConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => AgentConfig::from_file(path)?,
        None => AgentConfig::default(),
    };

    if let Some(version) = &cli.cache_version {
        config = config.with_version(version.clone());
    }
    if let Some(dir) = &cli.store_dir {
        config = config.with_store_dir(dir.clone());
    }
    if let Some(origin) = &cli.origin {
        config = config.with_origin(origin.clone());
    }

    Ok(config)
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let _logging_guard = sidecache::logging::init_logging(Path::new("logs"))?;

    let config = load_config(&cli)?;
    let store = Arc::new(DiskStore::open(&config.store_dir).await?);
    let agent = Agent::builder(config).store(store).build()?;

    match &cli.command {
        Command::Warm => commands::warm::run(&agent).await,
        Command::Fetch { url, method, body } => {
            commands::fetch::run(&agent, url, method, body.clone()).await
        }
        Command::Clear => commands::clear::run(&agent).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
