//! StationConfig - Config Loader output
//!
//! Describes one acquisition station: serial transport, store, simulator and ingest policy.
//! Every section has defaults so an empty document is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete station configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StationConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Serial transport settings
    #[serde(default)]
    #[validate(nested)]
    pub serial: SerialConfig,

    /// Record store settings
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// Device simulator settings
    #[serde(default)]
    #[validate(nested)]
    pub simulator: SimulatorConfig,

    /// Ingestion policy
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SerialConfig {
    /// Port path; auto-detected when exactly one port exists
    #[serde(default)]
    pub port: Option<String>,

    /// Baud rate, must match the firmware
    #[serde(default = "default_baud_rate")]
    #[validate(range(min = 1))]
    pub baud_rate: u32,

    /// Read timeout bounding every blocking read (ms)
    #[serde(default = "default_read_timeout_ms")]
    #[validate(range(min = 1))]
    pub read_timeout_ms: u64,

    /// Acquisition attempts before giving up
    #[serde(default = "default_acquire_attempts")]
    #[validate(range(min = 1))]
    pub acquire_attempts: u32,

    /// Pause between acquisition attempts (ms)
    #[serde(default = "default_acquire_backoff_ms")]
    pub acquire_backoff_ms: u64,
}

fn default_baud_rate() -> u32 {
    57_600
}

fn default_read_timeout_ms() -> u64 {
    1_000
}

fn default_acquire_attempts() -> u32 {
    5
}

fn default_acquire_backoff_ms() -> u64 {
    500
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            acquire_attempts: default_acquire_attempts(),
            acquire_backoff_ms: default_acquire_backoff_ms(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn acquire_backoff(&self) -> Duration {
        Duration::from_millis(self.acquire_backoff_ms)
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Database file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Table receiving records
    #[serde(default = "default_table")]
    #[validate(length(min = 1))]
    pub table: String,
}

impl StoreConfig {
    /// Table name is `[A-Za-z_][A-Za-z0-9_]*`, safe to splice into SQL
    pub fn has_plain_table_name(&self) -> bool {
        let mut chars = self.table.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("serial_output.db")
}

fn default_table() -> String {
    "data".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            table: default_table(),
        }
    }
}

/// Device simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulatorConfig {
    /// Delay emulating the device cycle time (ms)
    #[serde(default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,

    /// Chance per cycle that a short-circuit burst starts
    #[serde(default = "default_fault_probability")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub fault_probability: f64,

    /// Shortest fault burst (cycles)
    #[serde(default = "default_fault_min_cycles")]
    #[validate(range(min = 1))]
    pub fault_min_cycles: u32,

    /// Longest fault burst (cycles)
    #[serde(default = "default_fault_max_cycles")]
    #[validate(range(min = 1))]
    pub fault_max_cycles: u32,

    /// Fixed RNG seed for reproducible output
    #[serde(default)]
    pub seed: Option<u64>,

    /// Emit the firmware's loop banner before each loop
    #[serde(default = "default_true")]
    pub emit_loop_banner: bool,
}

fn default_cycle_delay_ms() -> u64 {
    100
}

fn default_fault_probability() -> f64 {
    0.03
}

fn default_fault_min_cycles() -> u32 {
    5
}

fn default_fault_max_cycles() -> u32 {
    12
}

fn default_true() -> bool {
    true
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            cycle_delay_ms: default_cycle_delay_ms(),
            fault_probability: default_fault_probability(),
            fault_min_cycles: default_fault_min_cycles(),
            fault_max_cycles: default_fault_max_cycles(),
            seed: None,
            emit_loop_banner: true,
        }
    }
}

impl SimulatorConfig {
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }
}

/// Ingestion policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reject raw/short_circuit/vout values outside their documented domain
    #[serde(default)]
    pub validate_domain: bool,

    /// Log every received line at debug level
    #[serde(default = "default_true")]
    pub echo_lines: bool,

    /// Stop after this many persisted records (0 = unlimited)
    #[serde(default)]
    pub max_records: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            validate_domain: false,
            echo_lines: true,
            max_records: 0,
        }
    }
}
