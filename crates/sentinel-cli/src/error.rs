//! Error handling for the Sentinel CLI

use sentinel_core::{ConfigError, SentinelError};
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Sentinel error: {0}")]
    Sentinel(#[from] SentinelError),

    #[error("{path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: SentinelError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Sentinel(err.into())
    }
}
