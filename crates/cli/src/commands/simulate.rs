//! `simulate` command implementation.

use std::io::{self, Write};

use anyhow::{Context, Result};
use contracts::SimulatorConfig;
use device::{DeviceSimulator, SimulatedCycle};
use observability::RunningStats;
use tracing::{info, warn};

use super::load_station;
use crate::cli::SimulateArgs;
use crate::pipeline::shutdown_signal;

/// Execute the `simulate` command
///
/// Device text goes to stdout so it can be piped into a file and replayed
/// later with `run --replay`.
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let station = load_station(args.config.as_deref())?;
    let config = simulator_config(station.simulator, args);
    let delay = config.cycle_delay();

    info!(
        seed = ?config.seed,
        delay_ms = config.cycle_delay_ms,
        cycles = ?args.cycles,
        "Simulating device output"
    );

    let mut simulator = DeviceSimulator::new(&config);
    let mut tally = CycleTally::default();
    let stdout = io::stdout();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    while args.cycles.is_none_or(|max| tally.cycles < max) {
        let cycle = simulator.next_cycle();
        tally.push(&cycle);

        let text = if args.packets_only {
            format!("{}\n", cycle.packet())
        } else {
            cycle.to_text()
        };

        let mut out = stdout.lock();
        match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            Ok(()) => {}
            // reader went away (`| head`)
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => break,
            Err(e) => return Err(e).context("Failed to write simulator output"),
        }
        drop(out);

        if !delay.is_zero() {
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping simulator");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    tally.log();
    Ok(())
}

fn simulator_config(mut config: SimulatorConfig, args: &SimulateArgs) -> SimulatorConfig {
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(delay_ms) = args.delay_ms {
        config.cycle_delay_ms = delay_ms;
    }
    if args.packets_only {
        config.emit_loop_banner = false;
    }
    config
}

/// Running totals over emitted cycles
#[derive(Default)]
struct CycleTally {
    cycles: u64,
    faults: u64,
    resistance: RunningStats,
}

impl CycleTally {
    fn push(&mut self, cycle: &SimulatedCycle) {
        self.cycles += 1;
        if cycle.fault {
            self.faults += 1;
        } else {
            self.resistance.push(cycle.record.resistance);
        }
    }

    fn log(&self) {
        info!(
            cycles = self.cycles,
            faults = self.faults,
            normal_resistance = %self.resistance.summary(),
            "Simulation finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ActiveLine;

    fn args(packets_only: bool) -> SimulateArgs {
        SimulateArgs {
            config: None,
            cycles: Some(6),
            seed: Some(4),
            delay_ms: Some(0),
            packets_only,
        }
    }

    #[test]
    fn test_cli_overrides_simulator_section() {
        let config = simulator_config(SimulatorConfig::default(), &args(true));
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.cycle_delay_ms, 0);
        assert!(!config.emit_loop_banner);
    }

    #[test]
    fn test_tally_counts_faults_apart() {
        let mut sim = DeviceSimulator::new(&SimulatorConfig {
            seed: Some(1),
            fault_probability: 0.0,
            ..Default::default()
        });
        let mut tally = CycleTally::default();
        for _ in 0..3 {
            tally.push(&sim.next_cycle());
        }

        assert_eq!(tally.cycles, 3);
        assert_eq!(tally.faults, 0);
        assert_eq!(tally.resistance.count(), 3);
        assert_eq!(sim.state().active_channel(), ActiveLine::C);
    }

    #[tokio::test]
    async fn test_bounded_simulation_finishes() {
        run_simulate(&args(true)).await.unwrap();
    }
}
