//! CLI error type.

use thiserror::Error;

use sidecache::agent::AgentBuildError;
use sidecache::config::ConfigError;
use sidecache::store::StoreError;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Agent could not be built
    #[error("agent error: {0}")]
    Agent(#[from] AgentBuildError),

    /// Logging setup failed
    #[error("logging error: {0}")]
    Logging(#[from] std::io::Error),

    /// Unknown HTTP method on the command line
    #[error("unsupported HTTP method: {0}")]
    InvalidMethod(String),

    /// The control channel closed without replying
    #[error("no reply received from control channel")]
    NoReply,
}
