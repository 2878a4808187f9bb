//! Capture Replay Example
//!
//! Re-ingests a serial capture (for example one produced by
//! `line-telemetry simulate > capture.log`) with domain validation on,
//! logging records instead of storing them.
//!
//! Run with: cargo run -p demos --bin capture_replay -- capture.log

use std::path::PathBuf;
use std::time::Duration;

use contracts::CancellationToken;
use device::{ReplayStream, DEFAULT_REPLAY_CHUNK_BYTES};
use ingestion::{IngestionLoop, LoopOptions, ParserOptions};
use store::LogSink;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init()?;

    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("usage: capture_replay <capture.log>");
        std::process::exit(2);
    };

    let stream = ReplayStream::open(
        &path,
        DEFAULT_REPLAY_CHUNK_BYTES,
        Some(Duration::from_millis(5)),
    )?;
    let options = LoopOptions {
        parser: ParserOptions {
            validate_domain: true,
        },
        echo_lines: false,
        max_records: None,
    };

    let summary = IngestionLoop::new(
        Box::new(stream),
        Box::new(LogSink::new("replay")),
        options,
        CancellationToken::new(),
    )
    .run()?;

    println!(
        "{} records, {} malformed, {} conversion errors, {} out of domain",
        summary.metrics.records_persisted,
        summary.metrics.malformed_lines,
        summary.metrics.conversion_errors,
        summary.metrics.out_of_domain
    );

    Ok(())
}
