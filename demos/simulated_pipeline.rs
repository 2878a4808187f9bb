//! Simulated Pipeline Example
//!
//! Drives the ingestion loop from the device simulator into a SQLite file,
//! without any hardware attached.
//!
//! Run with: cargo run -p demos --bin simulated_pipeline [config.toml]

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::{CancellationToken, StationConfig};
use device::SimulatedStream;
use ingestion::{IngestionLoop, LoopOptions};
use store::SqliteSink;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init()?;

    tracing::info!("Starting Simulated Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading station config");
        ConfigLoader::load_from_path(Path::new(&path))?
    } else {
        demo_config()
    };

    // ==== Stage 2: Open the store and the simulated device ====
    let sink = SqliteSink::open(&config.store)?;
    let stream = SimulatedStream::new(&config.simulator).with_max_cycles(60);

    // ==== Stage 3: Run until the simulator has produced 20 full loops ====
    let summary = IngestionLoop::new(
        Box::new(stream),
        Box::new(sink),
        LoopOptions::from(&config.ingest),
        CancellationToken::new(),
    )
    .run()?;

    tracing::info!(
        reason = ?summary.stop_reason,
        records = summary.metrics.records_persisted,
        faults = summary.metrics.fault_records,
        informational = summary.metrics.informational_lines,
        store = %config.store.path.display(),
        "Demo finished"
    );

    Ok(())
}

fn demo_config() -> StationConfig {
    let mut config = StationConfig::default();
    config.store.path = "demo_output.db".into();
    config.simulator.cycle_delay_ms = 10;
    config.simulator.seed = Some(2024);
    config
}
