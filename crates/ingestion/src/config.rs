//! Loop options and ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{IngestConfig, RejectReason};

use crate::parser::ParserOptions;

/// Ingestion loop options
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Parser behaviour
    pub parser: ParserOptions,

    /// Log every received line at debug level
    pub echo_lines: bool,

    /// Stop after this many persisted records
    pub max_records: Option<u64>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            parser: ParserOptions::default(),
            echo_lines: true,
            max_records: None,
        }
    }
}

impl From<&IngestConfig> for LoopOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            parser: ParserOptions {
                validate_domain: config.validate_domain,
            },
            echo_lines: config.echo_lines,
            max_records: (config.max_records > 0).then_some(config.max_records),
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Non-empty chunks read from the stream
    pub chunks_received: AtomicU64,

    /// Non-blank lines framed
    pub lines_received: AtomicU64,

    /// Lines without the `data:` prefix
    pub informational_lines: AtomicU64,

    /// Records handed to the sink
    pub records_persisted: AtomicU64,

    /// Persisted records carrying a short-circuit code
    pub fault_records: AtomicU64,

    /// Wrong field count
    pub malformed_lines: AtomicU64,

    /// Unconvertible token
    pub conversion_errors: AtomicU64,

    /// Domain check failures (strict mode)
    pub out_of_domain: AtomicU64,

    /// Successful commits
    pub commits: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_chunk(&self) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_line(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_informational(&self) {
        self.informational_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one persisted record
    pub fn record_persisted(&self, fault: bool) {
        self.records_persisted.fetch_add(1, Ordering::Relaxed);
        if fault {
            self.fault_records.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a rejected line by reason
    pub fn record_reject(&self, reason: &RejectReason) {
        let counter = match reason {
            RejectReason::MalformedLength { .. } => &self.malformed_lines,
            RejectReason::ConversionError { .. } => &self.conversion_errors,
            RejectReason::OutOfDomain { .. } => &self.out_of_domain,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records persisted so far
    pub fn persisted(&self) -> u64 {
        self.records_persisted.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            lines_received: self.lines_received.load(Ordering::Relaxed),
            informational_lines: self.informational_lines.load(Ordering::Relaxed),
            records_persisted: self.records_persisted.load(Ordering::Relaxed),
            fault_records: self.fault_records.load(Ordering::Relaxed),
            malformed_lines: self.malformed_lines.load(Ordering::Relaxed),
            conversion_errors: self.conversion_errors.load(Ordering::Relaxed),
            out_of_domain: self.out_of_domain.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub chunks_received: u64,
    pub lines_received: u64,
    pub informational_lines: u64,
    pub records_persisted: u64,
    pub fault_records: u64,
    pub malformed_lines: u64,
    pub conversion_errors: u64,
    pub out_of_domain: u64,
    pub commits: u64,
}

impl MetricsSnapshot {
    /// Total rejected lines
    pub fn rejected(&self) -> u64 {
        self.malformed_lines + self.conversion_errors + self.out_of_domain
    }
}
