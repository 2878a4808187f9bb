//! ProtocolParser - turns one device line into a Record
//!
//! Pure function of its input: no I/O, no logging.

use contracts::{
    short_circuit, ActiveLine, Record, RejectReason, DATA_PREFIX, FIELD_COUNT, FIELD_NAMES,
    RAW_MAX,
};
use std::str::FromStr;

/// Classification of a successfully handled line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A `data:` packet with 11 convertible fields
    Record(Record),

    /// Anything not starting with `data:` (diagnostic block, banners)
    Informational,
}

/// Parser options
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Reject values outside their documented domain.
    ///
    /// Off by default: out-of-range raw readings and unknown short-circuit
    /// codes are passed through unchanged.
    pub validate_domain: bool,
}

/// Device packet parser
#[derive(Debug, Clone, Default)]
pub struct ProtocolParser {
    options: ParserOptions,
}

impl ProtocolParser {
    /// Create parser with the given options
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    /// Parse one line (without its line terminator)
    ///
    /// # Errors
    /// - `MalformedLength` when the payload does not hold exactly 11 fields
    /// - `ConversionError` carrying the first token that is not a valid number
    /// - `OutOfDomain` only when `validate_domain` is enabled
    pub fn parse(&self, line: &str) -> Result<ParsedLine, RejectReason> {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return Ok(ParsedLine::Informational);
        };

        let tokens: Vec<&str> = payload.split(';').map(str::trim).collect();
        if tokens.len() != FIELD_COUNT {
            return Err(RejectReason::MalformedLength {
                expected: FIELD_COUNT,
                found: tokens.len(),
            });
        }

        let record = Record {
            loopcount: loopcount(&tokens, 0)?,
            active_line: active_line(&tokens, 1)?,
            digi_a: number(&tokens, 2)?,
            digi_b: number(&tokens, 3)?,
            digi_c: number(&tokens, 4)?,
            raw_a: number(&tokens, 5)?,
            raw_b: number(&tokens, 6)?,
            raw_c: number(&tokens, 7)?,
            vout: real(&tokens, 8)?,
            resistance: real(&tokens, 9)?,
            short_circuit: number(&tokens, 10)?,
        };

        if self.options.validate_domain {
            check_domain(&record)?;
        }

        Ok(ParsedLine::Record(record))
    }
}

/// Parse with default (permissive) options
pub fn parse_line(line: &str) -> Result<ParsedLine, RejectReason> {
    ProtocolParser::default().parse(line)
}

fn conversion_error(tokens: &[&str], idx: usize) -> RejectReason {
    RejectReason::ConversionError {
        field: FIELD_NAMES[idx],
        token: tokens[idx].to_string(),
    }
}

fn number<T: FromStr>(tokens: &[&str], idx: usize) -> Result<T, RejectReason> {
    tokens[idx]
        .parse()
        .map_err(|_| conversion_error(tokens, idx))
}

fn real(tokens: &[&str], idx: usize) -> Result<f64, RejectReason> {
    let value: f64 = number(tokens, idx)?;
    // "nan" / "inf" parse as f64 but the device never prints them
    if value.is_finite() {
        Ok(value)
    } else {
        Err(conversion_error(tokens, idx))
    }
}

// Stored as SQLite INTEGER, so the counter must fit an i64
fn loopcount(tokens: &[&str], idx: usize) -> Result<u64, RejectReason> {
    let value: i64 = number(tokens, idx)?;
    u64::try_from(value).map_err(|_| conversion_error(tokens, idx))
}

fn active_line(tokens: &[&str], idx: usize) -> Result<ActiveLine, RejectReason> {
    ActiveLine::from_token(tokens[idx]).ok_or_else(|| conversion_error(tokens, idx))
}

fn check_domain(record: &Record) -> Result<(), RejectReason> {
    let raws = [
        (FIELD_NAMES[5], record.raw_a),
        (FIELD_NAMES[6], record.raw_b),
        (FIELD_NAMES[7], record.raw_c),
    ];
    for (field, value) in raws {
        if !(0..=RAW_MAX).contains(&value) {
            return Err(RejectReason::OutOfDomain {
                field,
                value: value.to_string(),
            });
        }
    }
    if record.vout < 0.0 {
        return Err(RejectReason::OutOfDomain {
            field: FIELD_NAMES[8],
            value: record.vout.to_string(),
        });
    }
    if !short_circuit::is_known(record.short_circuit) {
        return Err(RejectReason::OutOfDomain {
            field: FIELD_NAMES[10],
            value: record.short_circuit.to_string(),
        });
    }
    Ok(())
}
