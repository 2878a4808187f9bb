//! Error types for CLI operations.

use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific errors that map to distinct exit codes
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// The device transport failed or could not be acquired
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The record store failed
    #[error("Storage failure: {message}")]
    Storage { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigNotFound { .. } => 2,
            Self::Transport { .. } => 3,
            Self::Storage { .. } => 4,
        }
    }
}

impl From<IngestionError> for CliError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Storage(e) => Self::storage(e.to_string()),
            IngestionError::Transport(e) => Self::transport(e.to_string()),
        }
    }
}
