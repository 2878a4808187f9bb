//! Sink implementations

mod log;
mod sqlite;

pub use log::LogSink;
pub use sqlite::SqliteSink;
