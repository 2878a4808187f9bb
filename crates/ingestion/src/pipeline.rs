//! IngestionLoop - reads a byte stream into a record sink
//!
//! Single control flow: one loop owns the stream and the sink from start
//! to stop, and both are closed on every exit path.

use std::time::{Duration, Instant};

use contracts::{ByteStream, CancellationToken, RecordSink, StreamChunk};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{IngestionMetrics, LoopOptions, MetricsSnapshot};
use crate::error::{IngestionError, Result};
use crate::framer::LineFramer;
use crate::parser::{ParsedLine, ProtocolParser};

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Why a run ended without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stream reported it will produce no more data
    EndOfStream,
    /// The cancellation token fired
    Cancelled,
    /// `max_records` were persisted
    LimitReached,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub metrics: MetricsSnapshot,
    pub duration: Duration,
}

impl RunSummary {
    /// Persisted records per second
    pub fn records_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.metrics.records_persisted as f64 / secs
        } else {
            0.0
        }
    }
}

/// What processing a batch of lines asks the loop to do next
enum Flow {
    Continue,
    Stop(StopReason),
}

/// Ingestion loop
///
/// ```ignore
/// let stream = acquire_transport(&config.serial)?;
/// let sink = SqliteSink::open(&config.store)?;
/// let summary = IngestionLoop::new(Box::new(stream), Box::new(sink), LoopOptions::default(), token)
///     .run()?;
/// ```
pub struct IngestionLoop {
    stream: Box<dyn ByteStream>,
    sink: Box<dyn RecordSink>,
    parser: ProtocolParser,
    framer: LineFramer,
    options: LoopOptions,
    cancel: CancellationToken,
    metrics: IngestionMetrics,
    state: LoopState,
}

impl IngestionLoop {
    /// Create a loop over an acquired stream and an open sink.
    ///
    /// The loop starts in [`LoopState::Running`].
    pub fn new(
        stream: Box<dyn ByteStream>,
        sink: Box<dyn RecordSink>,
        options: LoopOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            stream,
            sink,
            parser: ProtocolParser::new(options.parser),
            framer: LineFramer::default(),
            options,
            cancel,
            metrics: IngestionMetrics::new(),
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until the stream ends, cancellation, the record limit, or a fatal error.
    ///
    /// The sink and the stream are closed before this returns, whatever the outcome.
    #[instrument(
        name = "ingestion_run",
        skip(self),
        fields(stream = %self.stream.name(), sink = %self.sink.name())
    )]
    pub fn run(mut self) -> Result<RunSummary> {
        let started = Instant::now();
        info!("ingestion loop running");

        let outcome = self.drive();
        self.state = LoopState::Stopped;
        let released = self.release();

        let stop_reason = match (outcome, released) {
            (Ok(reason), Ok(())) => reason,
            (Ok(_), Err(close_err)) => return Err(close_err),
            (Err(err), released) => {
                if let Err(close_err) = released {
                    warn!(error = %close_err, "release after fatal error also failed");
                }
                warn!(kind = err.kind(), error = %err, "ingestion loop stopped on fatal error");
                return Err(err);
            }
        };

        let summary = RunSummary {
            stop_reason,
            metrics: self.metrics.snapshot(),
            duration: started.elapsed(),
        };
        info!(
            reason = ?summary.stop_reason,
            records = summary.metrics.records_persisted,
            rejected = summary.metrics.rejected(),
            "ingestion loop stopped"
        );
        Ok(summary)
    }

    fn drive(&mut self) -> Result<StopReason> {
        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation requested");
                return Ok(StopReason::Cancelled);
            }

            let chunk = self
                .stream
                .read_chunk()
                .map_err(IngestionError::Transport)?;

            match chunk {
                StreamChunk::Idle => continue,
                StreamChunk::Data(bytes) if bytes.is_empty() => continue,
                StreamChunk::Data(bytes) => {
                    self.metrics.record_chunk();
                    let lines = self.framer.push(&bytes);
                    if let Flow::Stop(reason) = self.process_batch(lines)? {
                        return Ok(reason);
                    }
                }
                StreamChunk::Closed => {
                    debug!("stream closed by peer");
                    let tail: Vec<String> = self.framer.finish().into_iter().collect();
                    return match self.process_batch(tail)? {
                        Flow::Stop(reason) => Ok(reason),
                        Flow::Continue => Ok(StopReason::EndOfStream),
                    };
                }
            }
        }
    }

    /// Parse, append and commit one chunk's worth of lines
    fn process_batch(&mut self, lines: Vec<String>) -> Result<Flow> {
        let mut appended = 0u64;
        let mut flow = Flow::Continue;

        for line in &lines {
            self.metrics.record_line();
            if self.options.echo_lines {
                debug!(line = %line, "line received");
            }

            match self.parser.parse(line) {
                Ok(ParsedLine::Record(record)) => {
                    self.sink
                        .append(&record)
                        .map_err(IngestionError::Storage)?;
                    appended += 1;
                    self.metrics.record_persisted(record.has_fault());
                    metrics::counter!("line_telemetry_lines_total", "kind" => "record")
                        .increment(1);
                    if record.has_fault() {
                        metrics::counter!("line_telemetry_faults_total").increment(1);
                    }

                    if self
                        .options
                        .max_records
                        .is_some_and(|max| self.metrics.persisted() >= max)
                    {
                        flow = Flow::Stop(StopReason::LimitReached);
                        break;
                    }
                }
                Ok(ParsedLine::Informational) => {
                    self.metrics.record_informational();
                    metrics::counter!("line_telemetry_lines_total", "kind" => "informational")
                        .increment(1);
                    trace!(line = %line, "informational line");
                }
                Err(reason) => {
                    self.metrics.record_reject(&reason);
                    metrics::counter!("line_telemetry_rejects_total", "reason" => reason.kind())
                        .increment(1);
                    warn!(reason = %reason, line = %line, "skipping line");
                }
            }
        }

        if !lines.is_empty() {
            self.sink.commit().map_err(IngestionError::Storage)?;
            self.metrics.record_commit();
            metrics::counter!("line_telemetry_commits_total").increment(1);
            metrics::histogram!("line_telemetry_chunk_records").record(appended as f64);
            metrics::counter!("line_telemetry_records_total").increment(appended);
        }

        Ok(flow)
    }

    /// Close sink then stream; a sink failure is a storage error
    fn release(&mut self) -> Result<()> {
        let sink_closed = self.sink.close();
        if let Err(e) = self.stream.close() {
            warn!(error = %e, "failed to close stream");
        }
        sink_closed.map_err(IngestionError::Storage)
    }
}
