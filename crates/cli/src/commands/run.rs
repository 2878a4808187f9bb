//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::StationConfig;
use std::time::Duration;
use tracing::info;

use super::load_station;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig, Source};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut station = load_station(args.config.as_deref())?;
    apply_overrides(&mut station, args);
    config_loader::ConfigLoader::validate(&station)
        .context("Configuration invalid after command-line overrides")?;

    let source = if args.source.simulate {
        Source::Simulator {
            max_cycles: args.cycles,
        }
    } else if let Some(path) = &args.source.replay {
        Source::Replay {
            path: path.clone(),
            pace: args.replay_pace_ms.map(Duration::from_millis),
        }
    } else {
        Source::Serial
    };

    info!(
        source = ?source,
        store = %station.store.path.display(),
        table = %station.store.table,
        validate_domain = station.ingest.validate_domain,
        max_records = station.ingest.max_records,
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        station,
        source,
        dry_run: args.dry_run,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    let stats = pipeline.run().await?;

    info!(
        reason = ?stats.summary.stop_reason,
        records = stats.summary.metrics.records_persisted,
        rejected = stats.summary.metrics.rejected(),
        duration_secs = stats.summary.duration.as_secs_f64(),
        "Ingestion finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(station: &mut StationConfig, args: &RunArgs) {
    if let Some(port) = &args.port {
        info!(port = %port, "Overriding serial port from CLI");
        station.serial.port = Some(port.clone());
    }
    if let Some(baud) = args.baud {
        station.serial.baud_rate = baud;
    }
    if let Some(db) = &args.db {
        station.store.path = db.clone();
    }
    if args.strict {
        station.ingest.validate_domain = true;
    }
    if let Some(max) = args.max_records {
        station.ingest.max_records = max;
    }
    if let Some(seed) = args.seed {
        station.simulator.seed = Some(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::path::PathBuf;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["line-telemetry", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let args = run_args(&[
            "--port",
            "/dev/ttyACM0",
            "--baud",
            "115200",
            "--db",
            "bench.db",
            "--strict",
            "--max-records",
            "50",
        ]);
        let mut station = StationConfig::default();
        apply_overrides(&mut station, &args);

        assert_eq!(station.serial.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(station.serial.baud_rate, 115_200);
        assert_eq!(station.store.path, PathBuf::from("bench.db"));
        assert!(station.ingest.validate_domain);
        assert_eq!(station.ingest.max_records, 50);
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let args = run_args(&[]);
        let mut station = StationConfig::default();
        apply_overrides(&mut station, &args);

        assert_eq!(station.serial.port, None);
        assert_eq!(station.serial.baud_rate, 57_600);
        assert!(!station.ingest.validate_domain);
    }
}
