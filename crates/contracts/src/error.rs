//! Layered error definitions
//!
//! Categorized by source: config / transport / storage.
//! Parse-level rejections are kept apart in [`RejectReason`] because they never abort a run.

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Byte stream failure (device unplugged, port error)
    #[error("transport '{stream}' error: {message}")]
    Transport { stream: String, message: String },

    /// No transport could be acquired
    #[error("no transport found after {attempts} attempt(s)")]
    TransportNotFound { attempts: u32 },

    // ===== Storage Errors =====
    /// Persistence failure
    #[error("storage '{sink_name}' error: {message}")]
    Storage {
        sink_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Create storage error without an underlying cause
    pub fn storage(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            sink_name: sink_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create storage error wrapping the driver error
    pub fn storage_with_source<E>(sink_name: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            sink_name: sink_name.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

/// Why a `data:` line did not produce a [`crate::Record`].
///
/// Always non-fatal: the ingestion loop logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Field count after the prefix was not [`crate::FIELD_COUNT`]
    #[error("malformed packet: expected {expected} fields, found {found}")]
    MalformedLength { expected: usize, found: usize },

    /// A token could not be converted to its field type
    #[error("cannot convert field '{field}' from token {token:?}")]
    ConversionError { field: &'static str, token: String },

    /// A converted value lies outside its documented domain (strict mode only)
    #[error("field '{field}' out of domain: {value}")]
    OutOfDomain { field: &'static str, value: String },
}

impl RejectReason {
    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedLength { .. } => "malformed_length",
            Self::ConversionError { .. } => "conversion_error",
            Self::OutOfDomain { .. } => "out_of_domain",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_source() {
        let io = std::io::Error::other("disk full");
        let err = ContractError::storage_with_source("sqlite", io);
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn reject_kind_labels() {
        let malformed = RejectReason::MalformedLength {
            expected: 11,
            found: 4,
        };
        assert_eq!(malformed.kind(), "malformed_length");
        assert!(malformed.to_string().contains("found 4"));

        let conversion = RejectReason::ConversionError {
            field: "raw_A",
            token: "x".into(),
        };
        assert_eq!(conversion.kind(), "conversion_error");
    }
}
