//! Record - ProtocolParser output
//!
//! One telemetry sample as reported by the device on a `data:` line.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix that marks a machine-readable packet line
pub const DATA_PREFIX: &str = "data:";

/// Number of `;`-separated fields after [`DATA_PREFIX`]
pub const FIELD_COUNT: usize = 11;

/// Upper bound of a 10-bit ADC reading
pub const RAW_MAX: i64 = 1023;

/// Positional field names, in wire order
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "loopcount",
    "active_line",
    "digi_A",
    "digi_B",
    "digi_C",
    "raw_A",
    "raw_B",
    "raw_C",
    "vout",
    "resistance",
    "short_circuit",
];

/// Measurement channel multiplexed by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActiveLine {
    A,
    B,
    C,
}

impl ActiveLine {
    /// Order in which the firmware reads its channels
    pub const SEQUENCE: [ActiveLine; 3] = [ActiveLine::C, ActiveLine::B, ActiveLine::A];

    /// Parse the single-character wire token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }

    /// Wire character
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }

    /// Channel that follows `self` in [`ActiveLine::SEQUENCE`] (wrapping)
    pub fn next(self) -> Self {
        match self {
            Self::C => Self::B,
            Self::B => Self::A,
            Self::A => Self::C,
        }
    }
}

impl fmt::Display for ActiveLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Short-circuit status reported with every sample.
///
/// The firmware reports how many lines read above the alert level,
/// so a fault is always 2 or 3; 0 means no fault.
pub mod short_circuit {
    /// No fault
    pub const NONE: i64 = 0;
    /// Two lines shorted
    pub const TWO_LINES: i64 = 2;
    /// All three lines shorted
    pub const THREE_LINES: i64 = 3;

    /// Whether `value` is one of the codes the device emits
    pub fn is_known(value: i64) -> bool {
        matches!(value, NONE | TWO_LINES | THREE_LINES)
    }
}

/// One telemetry sample.
///
/// Immutable once parsed. The storage identifier is assigned by the sink
/// and is not part of the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Device loop counter, monotonic per device run
    pub loopcount: u64,

    /// Channel this sample reports
    pub active_line: ActiveLine,

    /// Reserved digital channel fields, currently always 0
    pub digi_a: i64,
    pub digi_b: i64,
    pub digi_c: i64,

    /// 10-bit ADC readings, nominally in [0, 1023]
    pub raw_a: i64,
    pub raw_b: i64,
    pub raw_c: i64,

    /// Derived voltage for the active channel (V)
    pub vout: f64,

    /// Derived resistance for the active channel (Ω)
    pub resistance: f64,

    /// 0, 2 or 3, see [`short_circuit`]
    pub short_circuit: i64,
}

impl Record {
    /// Whether the sample carries a short-circuit signature
    pub fn has_fault(&self) -> bool {
        self.short_circuit != short_circuit::NONE
    }

    /// Raw reading of the channel named by `active_line`
    pub fn active_raw(&self) -> i64 {
        match self.active_line {
            ActiveLine::A => self.raw_a,
            ActiveLine::B => self.raw_b,
            ActiveLine::C => self.raw_c,
        }
    }

    /// Format as a device packet line (without trailing newline)
    pub fn to_wire_line(&self) -> String {
        format!(
            "{DATA_PREFIX}{};{};{};{};{};{};{};{};{:.2};{:.2};{}",
            self.loopcount,
            self.active_line,
            self.digi_a,
            self.digi_b,
            self.digi_c,
            self.raw_a,
            self.raw_b,
            self.raw_c,
            self.vout,
            self.resistance,
            self.short_circuit
        )
    }
}
