//! Pipeline orchestrator - wires source, sink and ingestion loop.
//!
//! The ingestion loop is blocking by design and runs on a blocking thread;
//! the async side only watches for interrupts and the run timeout.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{ByteStream, CancellationToken, ContractError, RecordSink, StationConfig};
use device::{acquire_transport, ReplayStream, SimulatedStream, DEFAULT_REPLAY_CHUNK_BYTES};
use ingestion::{IngestionLoop, LoopOptions, StopReason};
use store::{LogSink, SqliteSink};
use tracing::{info, warn};

use super::{shutdown_signal, PipelineStats};
use crate::error::CliError;

/// Where telemetry comes from
#[derive(Debug, Clone)]
pub enum Source {
    /// Real device on a serial port
    Serial,
    /// Built-in device simulator
    Simulator { max_cycles: Option<u64> },
    /// Captured serial log
    Replay { path: PathBuf, pace: Option<Duration> },
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Station configuration after CLI overrides
    pub station: StationConfig,

    /// Telemetry source
    pub source: Source,

    /// Log records instead of writing the database
    pub dry_run: bool,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let token = CancellationToken::new();
        let watcher = tokio::spawn(watch_for_stop(token.clone(), self.config.timeout));

        let config = self.config;
        let outcome = tokio::task::spawn_blocking(move || run_blocking(&config, token))
            .await
            .context("Ingestion task panicked");
        watcher.abort();

        let stats = outcome??;
        observability::record_run_outcome(
            stop_label(stats.summary.stop_reason),
            stats.summary.duration,
        );
        Ok(stats)
    }
}

/// Open the sink, acquire the stream, run the loop
///
/// The store is opened first so a missing device never leaves an
/// acquired port behind; a failed acquisition closes the store.
fn run_blocking(config: &PipelineConfig, token: CancellationToken) -> Result<PipelineStats> {
    let mut sink = open_sink(config)?;

    let stream = match open_source(config) {
        Ok(stream) => stream,
        Err(e) => {
            if let Err(close_err) = sink.close() {
                warn!(error = %close_err, "Failed to close store after acquisition failure");
            }
            return Err(e);
        }
    };

    let source_name = stream.name().to_string();
    let sink_name = sink.name().to_string();
    info!(source = %source_name, sink = %sink_name, "Starting ingestion");

    let options = LoopOptions::from(&config.station.ingest);
    let summary = IngestionLoop::new(stream, sink, options, token)
        .run()
        .map_err(|e| {
            observability::record_run_failure(e.kind());
            CliError::from(e)
        })?;

    Ok(PipelineStats {
        summary,
        source: source_name,
        sink: sink_name,
    })
}

fn open_sink(config: &PipelineConfig) -> Result<Box<dyn RecordSink>> {
    if config.dry_run {
        info!("Dry run - records are logged, not stored");
        return Ok(Box::new(LogSink::new("dry_run")));
    }

    let sink = SqliteSink::open(&config.station.store)
        .map_err(|e| CliError::storage(e.to_string()))?;
    Ok(Box::new(sink))
}

fn open_source(config: &PipelineConfig) -> Result<Box<dyn ByteStream>> {
    let station = &config.station;
    match &config.source {
        Source::Serial => {
            info!(
                port = station.serial.port.as_deref().unwrap_or("auto"),
                baud = station.serial.baud_rate,
                attempts = station.serial.acquire_attempts,
                "Acquiring serial transport"
            );
            match acquire_transport(&station.serial) {
                Ok(stream) => Ok(Box::new(stream)),
                // several ports and none chosen: an operator decision, not a device fault
                Err(e @ ContractError::ConfigValidation { .. }) => {
                    Err(e).context("Cannot choose a serial port")
                }
                Err(e) => Err(CliError::transport(e.to_string()).into()),
            }
        }
        Source::Simulator { max_cycles } => {
            let stream = SimulatedStream::new(&station.simulator);
            let stream = match max_cycles {
                Some(cycles) => stream.with_max_cycles(*cycles),
                None => stream,
            };
            Ok(Box::new(stream))
        }
        Source::Replay { path, pace } => {
            let stream = ReplayStream::open(path, DEFAULT_REPLAY_CHUNK_BYTES, *pace)
                .map_err(|e| CliError::transport(e.to_string()))?;
            Ok(Box::new(stream))
        }
    }
}

/// Cancel the run on interrupt or timeout
async fn watch_for_stop(token: CancellationToken, timeout: Option<Duration>) {
    let timer = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping after the current chunk");
        }
        _ = timer => {
            info!("Timeout reached, stopping");
        }
    }
    token.cancel();
}

fn stop_label(reason: StopReason) -> &'static str {
    match reason {
        StopReason::EndOfStream => "end_of_stream",
        StopReason::Cancelled => "cancelled",
        StopReason::LimitReached => "limit_reached",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SimulatorConfig;

    fn simulated(db: PathBuf, cycles: u64) -> PipelineConfig {
        let mut station = StationConfig::default();
        station.store.path = db;
        station.simulator = SimulatorConfig {
            cycle_delay_ms: 0,
            seed: Some(9),
            ..Default::default()
        };
        PipelineConfig {
            station,
            source: Source::Simulator {
                max_cycles: Some(cycles),
            },
            dry_run: false,
            timeout: None,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_simulated_run_persists_every_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = simulated(dir.path().join("out.db"), 30);

        let stats = Pipeline::new(config).run().await.unwrap();

        assert_eq!(stats.summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(stats.summary.metrics.records_persisted, 30);
        assert_eq!(stats.source, "simulator");

        let store = SqliteSink::open_path(&dir.path().join("out.db"), "data").unwrap();
        assert_eq!(store.row_count().unwrap(), 30);
    }

    #[tokio::test]
    async fn test_timeout_cancels_endless_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = simulated(dir.path().join("out.db"), 0);
        config.source = Source::Simulator { max_cycles: None };
        config.station.simulator.cycle_delay_ms = 5;
        config.timeout = Some(Duration::from_millis(200));

        let stats = Pipeline::new(config).run().await.unwrap();
        assert_eq!(stats.summary.stop_reason, StopReason::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_replay_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = simulated(dir.path().join("out.db"), 0);
        config.source = Source::Replay {
            path: dir.path().join("missing.log"),
            pace: None,
        };

        let err = Pipeline::new(config).run().await.unwrap_err();
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli_err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_writes_no_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("out.db");
        let mut config = simulated(db.clone(), 6);
        config.dry_run = true;

        let stats = Pipeline::new(config).run().await.unwrap();
        assert_eq!(stats.summary.metrics.records_persisted, 6);
        assert_eq!(stats.sink, "dry_run");
        assert!(!db.exists());
    }
}
