//! # Ingestion Pipeline
//!
//! Telemetry ingestion module.
//!
//! Responsibilities:
//! - Frame raw transport chunks into text lines
//! - Parse `data:` packets into `Record`
//! - Append records to a `RecordSink` and commit once per chunk
//! - Skip and count non-fatal rejections, stop on storage/transport failure
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionLoop, LoopOptions};
//! use contracts::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let summary = IngestionLoop::new(stream, sink, LoopOptions::default(), token.clone()).run()?;
//! println!("{} records", summary.metrics.records_persisted);
//! ```

mod config;
mod error;
mod framer;
mod parser;
mod pipeline;

// Re-exports
pub use config::{IngestionMetrics, LoopOptions, MetricsSnapshot};
pub use contracts::Record;
pub use error::{IngestionError, Result};
pub use framer::{LineFramer, DEFAULT_MAX_LINE_BYTES};
pub use parser::{parse_line, ParsedLine, ParserOptions, ProtocolParser};
pub use pipeline::{IngestionLoop, LoopState, RunSummary, StopReason};
