//! # Device
//!
//! Telemetry sources.
//!
//! Responsibilities:
//! - Simulate the measurement device's serial output (channel rotation, fault bursts)
//! - Open the real serial port, with bounded acquisition retries
//! - Replay captured serial logs
//! - Expose every source as a `ByteStream`

pub mod replay;
pub mod serial;
pub mod simulated_stream;
pub mod simulator;

pub use contracts::{ByteStream, StreamChunk};
pub use replay::{ReplayStream, DEFAULT_REPLAY_CHUNK_BYTES};
pub use serial::{acquire_transport, acquire_with, select_port, SerialStream};
pub use simulated_stream::SimulatedStream;
pub use simulator::{
    derive_reading, loop_banner, DeviceSimulator, SimulatedCycle, SimulatorState,
    NORMAL_RESISTANCE_MAX, REFERENCE_RESISTANCE_OHMS, SUPPLY_VOLTS,
};
