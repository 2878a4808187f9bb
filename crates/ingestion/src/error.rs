//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Fatal ingestion error
///
/// Parse rejections never surface here; only the two failure kinds that
/// stop a run do, and they stay distinguishable.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The record store failed
    #[error("storage failure: {0}")]
    Storage(#[source] ContractError),

    /// The byte stream failed (device unplugged, port error)
    #[error("transport failure: {0}")]
    Transport(#[source] ContractError),
}

impl IngestionError {
    /// Stable label for logs and exit reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Transport(_) => "transport",
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
