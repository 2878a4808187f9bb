//! Device simulator
//!
//! Generates text shaped exactly like the measurement device's serial
//! output, one measurement cycle per call. Used for development and tests
//! without hardware attached.

use std::ops::RangeInclusive;
use std::time::Duration;

use contracts::{short_circuit, ActiveLine, Record, SimulatorConfig, RAW_MAX};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// Reference resistor R1 of the measurement divider (Ω)
pub const REFERENCE_RESISTANCE_OHMS: f64 = 22.0;

/// Divider supply voltage Vin (V)
pub const SUPPLY_VOLTS: f64 = 4.1;

/// Upper clamp applied to resistance outside fault bursts (Ω)
pub const NORMAL_RESISTANCE_MAX: f64 = 20.0;

/// Raw band whose derived resistance stays inside [0, NORMAL_RESISTANCE_MAX]
const NORMAL_BAND: RangeInclusive<i64> = 550..=1023;
/// Near-saturation readings of an intermittent contact
const SATURATION_BAND: RangeInclusive<i64> = 950..=1023;
/// Low readings of an intermittent contact
const INTERFERENCE_BAND: RangeInclusive<i64> = 100..=400;
/// Channel C during a fault
const WIDE_BAND: RangeInclusive<i64> = 500..=1023;

/// Simulator state machine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulatorState {
    /// Completed C,B,A rotations
    pub loop_counter: u64,
    /// Position in [`ActiveLine::SEQUENCE`]
    pub sequence_index: usize,
    /// A fault burst is in progress
    pub short_active: bool,
    /// Cycles left in the current fault burst
    pub short_remaining: u32,
}

impl SimulatorState {
    /// Channel reported by the next cycle
    pub fn active_channel(&self) -> ActiveLine {
        ActiveLine::SEQUENCE[self.sequence_index]
    }

    fn advance(&mut self) {
        self.sequence_index += 1;
        if self.sequence_index == ActiveLine::SEQUENCE.len() {
            self.sequence_index = 0;
            self.loop_counter += 1;
        }
    }
}

/// Output of one measurement cycle
#[derive(Debug, Clone)]
pub struct SimulatedCycle {
    /// Loop banner, present before the first channel of a loop
    pub banner: Option<String>,
    /// Human-readable block, never parsed
    pub diagnostic: String,
    /// Sample carried by the packet line
    pub record: Record,
    /// Cycle was generated in fault mode
    pub fault: bool,
}

impl SimulatedCycle {
    /// Machine-readable packet line
    pub fn packet(&self) -> String {
        self.record.to_wire_line()
    }

    /// Full serial text: banner, diagnostic block, then the packet line
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        if let Some(banner) = &self.banner {
            text.push_str(banner);
        }
        text.push_str(&self.diagnostic);
        text.push('\n');
        text.push_str(&self.packet());
        text.push('\n');
        text
    }
}

/// Device simulator
///
/// Owns its state and random source; nothing is shared between instances.
///
/// ```ignore
/// let mut sim = DeviceSimulator::new(&SimulatorConfig::default());
/// let cycle = sim.next_cycle();
/// print!("{}", cycle.to_text());
/// ```
pub struct DeviceSimulator {
    config: SimulatorConfig,
    rng: StdRng,
    state: SimulatorState,
    fault_probability: f64,
    fault_cycles: RangeInclusive<u32>,
}

impl DeviceSimulator {
    /// Create a simulator; seeded from the OS unless `config.seed` is set
    pub fn new(config: &SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let fault_probability = if config.fault_probability.is_finite() {
            config.fault_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let shortest = config.fault_min_cycles.max(1);
        let longest = config.fault_max_cycles.max(shortest);

        Self {
            config: config.clone(),
            rng,
            state: SimulatorState::default(),
            fault_probability,
            fault_cycles: shortest..=longest,
        }
    }

    /// Current state
    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    /// Configured per-cycle delay
    pub fn cycle_delay(&self) -> Duration {
        self.config.cycle_delay()
    }

    /// Run one measurement cycle and advance the channel rotation
    pub fn next_cycle(&mut self) -> SimulatedCycle {
        let active = self.state.active_channel();
        let banner = (self.config.emit_loop_banner && self.state.sequence_index == 0)
            .then(|| loop_banner(self.state.loop_counter));

        if !self.state.short_active && self.rng.random_bool(self.fault_probability) {
            self.state.short_active = true;
            self.state.short_remaining = self.rng.random_range(self.fault_cycles.clone());
            debug!(
                loop_counter = self.state.loop_counter,
                cycles = self.state.short_remaining,
                "fault burst started"
            );
        }

        let fault = self.state.short_active;
        let (raw_a, raw_b, raw_c, status) = if fault {
            let raw_a = self.contact_reading();
            let raw_b = self.contact_reading();
            let raw_c = self.rng.random_range(WIDE_BAND);
            let status = if self.rng.random_bool(0.5) {
                short_circuit::TWO_LINES
            } else {
                short_circuit::THREE_LINES
            };

            self.state.short_remaining = self.state.short_remaining.saturating_sub(1);
            if self.state.short_remaining == 0 {
                self.state.short_active = false;
                debug!(loop_counter = self.state.loop_counter, "fault burst ended");
            }
            (raw_a, raw_b, raw_c, status)
        } else {
            (
                self.rng.random_range(NORMAL_BAND),
                self.rng.random_range(NORMAL_BAND),
                self.rng.random_range(NORMAL_BAND),
                short_circuit::NONE,
            )
        };

        let raw_active = match active {
            ActiveLine::A => raw_a,
            ActiveLine::B => raw_b,
            ActiveLine::C => raw_c,
        };
        let (vout, resistance) = derive_reading(raw_active, !fault);

        let record = Record {
            loopcount: self.state.loop_counter,
            active_line: active,
            digi_a: 0,
            digi_b: 0,
            digi_c: 0,
            raw_a,
            raw_b,
            raw_c,
            vout,
            resistance,
            short_circuit: status,
        };
        trace!(line = %active, raw = raw_active, fault, "cycle generated");

        let diagnostic = diagnostic_block(&record);
        self.state.advance();

        SimulatedCycle {
            banner,
            diagnostic,
            record,
            fault,
        }
    }

    /// Intermittent contact: jumps between saturation and interference
    fn contact_reading(&mut self) -> i64 {
        if self.rng.random_bool(0.5) {
            self.rng.random_range(SATURATION_BAND)
        } else {
            self.rng.random_range(INTERFERENCE_BAND)
        }
    }
}

/// Voltage and resistance derived from one raw reading
///
/// `vout = raw * Vin / 1023`, `resistance = R1 * (Vin / vout - 1)` (0 when
/// `vout` is 0). With `clamp`, resistance is limited to [0, 20].
pub fn derive_reading(raw: i64, clamp: bool) -> (f64, f64) {
    let vout = raw as f64 * SUPPLY_VOLTS / RAW_MAX as f64;
    let resistance = if vout > 0.0 {
        REFERENCE_RESISTANCE_OHMS * (SUPPLY_VOLTS / vout - 1.0)
    } else {
        0.0
    };

    if clamp {
        (vout, resistance.clamp(0.0, NORMAL_RESISTANCE_MAX))
    } else {
        (vout, resistance)
    }
}

/// Banner the firmware prints at the start of every loop
pub fn loop_banner(loop_counter: u64) -> String {
    format!(" \n*********** Loop: {loop_counter} **********\n")
}

fn diagnostic_block(record: &Record) -> String {
    let line = record.active_line;
    format!(
        "\n ------- Line {line} ------- \n\
         Output A: {}\nOutput B: {}\nOutput C: {}\n \n\
         Raw A: {}\nRaw B: {}\nRaw C: {}\n \n\
         Vout {line}: {:.2} V\n\
         Resistance {line}: {:.2} Ω\n\
         ----------------------",
        record.digi_a,
        record.digi_b,
        record.digi_c,
        record.raw_a,
        record.raw_b,
        record.raw_c,
        record.vout,
        record.resistance,
    )
}
