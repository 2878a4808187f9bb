//! # Store
//!
//! `RecordSink` implementations.
//!
//! - [`SqliteSink`]: durable append-only table in a SQLite file
//! - [`LogSink`]: logs every record via tracing, persists nothing

pub mod sinks;

pub use contracts::{Record, RecordSink};
pub use sinks::{LogSink, SqliteSink};
