//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No seeded user has this id.
    #[error("unknown user '{0}'. Run 'tablegate users' to list accounts")]
    UnknownUser(String),

    /// No order was found matching the given prefix.
    #[error("no order found matching '{prefix}'")]
    OrderNotFound { prefix: String },

    /// Multiple orders match the given prefix.
    ///
    /// The user should provide a longer prefix to disambiguate.
    #[error("multiple orders match '{prefix}': {matches:?}")]
    AmbiguousOrder {
        prefix: String,
        matches: Vec<String>,
    },

    /// A `--line` argument or shell command could not be parsed.
    #[error("bad input: {0}")]
    Input(String),

    /// The data directory could not be determined.
    #[error("no data directory available; set store.path in tablegate.toml")]
    NoDataDir,

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway refused or failed the request.
    #[error(transparent)]
    Gateway(#[from] gateway::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),

    /// Failed to render JSON output.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
