//! RecordSink trait - durable output interface
//!
//! Defines the abstract interface for record sinks.

use crate::{ContractError, Record};

/// Record output trait
///
/// Append and commit are separate so the caller decides the durability
/// granularity. All sink implementations must implement this trait.
pub trait RecordSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Queue one record for persistence
    ///
    /// # Errors
    /// Returns `ContractError::Storage` with the underlying cause
    fn append(&mut self, record: &Record) -> Result<(), ContractError>;

    /// Make every appended record durable
    fn commit(&mut self) -> Result<(), ContractError>;

    /// Commit anything pending and release the store
    ///
    /// Must be safe to call more than once.
    fn close(&mut self) -> Result<(), ContractError>;
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn append(&mut self, record: &Record) -> Result<(), ContractError> {
        (**self).append(record)
    }

    fn commit(&mut self) -> Result<(), ContractError> {
        (**self).commit()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}
