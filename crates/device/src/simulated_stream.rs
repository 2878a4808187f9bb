//! Simulator exposed as a byte stream

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{ByteStream, ContractError, SimulatorConfig, StreamChunk};
use tracing::debug;

use crate::simulator::DeviceSimulator;

/// Byte stream backed by a [`DeviceSimulator`]
///
/// Each read sleeps for the configured cycle delay, then returns the text
/// of one measurement cycle. With `max_cycles` set, the stream reports
/// `Closed` once that many cycles were emitted.
pub struct SimulatedStream {
    simulator: DeviceSimulator,
    delay: Duration,
    max_cycles: Option<u64>,
    emitted: u64,
    closed: bool,
}

impl SimulatedStream {
    pub fn new(config: &SimulatorConfig) -> Self {
        let simulator = DeviceSimulator::new(config);
        Self {
            delay: simulator.cycle_delay(),
            simulator,
            max_cycles: None,
            emitted: 0,
            closed: false,
        }
    }

    /// End the stream after `cycles` cycles
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Cycles emitted so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl ByteStream for SimulatedStream {
    fn name(&self) -> &str {
        "simulator"
    }

    fn read_chunk(&mut self) -> Result<StreamChunk, ContractError> {
        if self.closed || self.max_cycles.is_some_and(|max| self.emitted >= max) {
            return Ok(StreamChunk::Closed);
        }

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let cycle = self.simulator.next_cycle();
        self.emitted += 1;
        Ok(StreamChunk::Data(Bytes::from(cycle.to_text())))
    }

    fn close(&mut self) -> Result<(), ContractError> {
        if !self.closed {
            self.closed = true;
            debug!(cycles = self.emitted, "simulated stream closed");
        }
        Ok(())
    }
}
