//! Serial transport
//!
//! Opens the device's serial port and exposes it as a `ByteStream`.
//! Acquisition retries with a fixed backoff and gives up with a definite
//! `TransportNotFound` after the configured number of attempts.

use std::io::{ErrorKind, Read};
use std::thread;

use bytes::Bytes;
use contracts::{ByteStream, ContractError, SerialConfig, StreamChunk};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

const READ_BUFFER_BYTES: usize = 1024;

/// Serial port stream
pub struct SerialStream {
    name: String,
    port: Option<Box<dyn SerialPort>>,
    buf: Vec<u8>,
}

impl SerialStream {
    /// Open a serial port at the configured baud rate (8N1, no flow control)
    ///
    /// Every read is bounded by `config.read_timeout_ms`.
    pub fn open(path: &str, config: &SerialConfig) -> Result<Self, ContractError> {
        let port = serialport::new(path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| ContractError::transport(path, e.to_string()))?;

        info!(port = %path, baud = config.baud_rate, "serial port opened");

        Ok(Self {
            name: path.to_string(),
            port: Some(port),
            buf: vec![0u8; READ_BUFFER_BYTES],
        })
    }
}

impl ByteStream for SerialStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_chunk(&mut self) -> Result<StreamChunk, ContractError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(StreamChunk::Closed);
        };

        match port.read(&mut self.buf) {
            Ok(0) => Ok(StreamChunk::Idle),
            Ok(n) => Ok(StreamChunk::Data(Bytes::copy_from_slice(&self.buf[..n]))),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(StreamChunk::Idle)
            }
            Err(e) => Err(ContractError::transport(&self.name, e.to_string())),
        }
    }

    fn close(&mut self) -> Result<(), ContractError> {
        if self.port.take().is_some() {
            debug!(port = %self.name, "serial port closed");
        }
        Ok(())
    }
}

/// Choose the port to open
///
/// An explicit port always wins. Otherwise a single available port is
/// chosen; no port yields `None`; several ports are ambiguous.
pub fn select_port(
    available: &[String],
    explicit: Option<&str>,
) -> Result<Option<String>, ContractError> {
    if let Some(port) = explicit {
        return Ok(Some(port.to_string()));
    }

    match available {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        many => Err(ContractError::config_validation(
            "serial.port",
            format!(
                "{} serial ports found ({}), select one with --port",
                many.len(),
                many.join(", ")
            ),
        )),
    }
}

/// Acquire the device transport
///
/// ```ignore
/// let stream = acquire_transport(&config.serial)?;
/// ```
pub fn acquire_transport(config: &SerialConfig) -> Result<SerialStream, ContractError> {
    acquire_with(config, list_ports, |path| SerialStream::open(path, config))
}

/// Acquisition loop with injectable port listing and opening
///
/// Makes up to `acquire_attempts` attempts separated by
/// `acquire_backoff_ms`. An ambiguous port list fails immediately.
pub fn acquire_with<S, L, O>(
    config: &SerialConfig,
    mut list: L,
    mut open: O,
) -> Result<S, ContractError>
where
    L: FnMut() -> Result<Vec<String>, ContractError>,
    O: FnMut(&str) -> Result<S, ContractError>,
{
    let attempts = config.acquire_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let available = match config.port {
            Some(_) => Vec::new(),
            None => list()?,
        };

        match select_port(&available, config.port.as_deref())? {
            Some(path) => match open(&path) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    warn!(port = %path, attempt, error = %e, "failed to open serial port");
                    last_error = Some(e);
                }
            },
            None => debug!(attempt, "no serial port available"),
        }

        if attempt < attempts {
            thread::sleep(config.acquire_backoff());
        }
    }

    Err(last_error.unwrap_or(ContractError::TransportNotFound { attempts }))
}

fn list_ports() -> Result<Vec<String>, ContractError> {
    let ports = serialport::available_ports()
        .map_err(|e| ContractError::transport("serial", format!("cannot enumerate ports: {e}")))?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(port: Option<&str>, attempts: u32) -> SerialConfig {
        SerialConfig {
            port: port.map(str::to_string),
            acquire_attempts: attempts,
            acquire_backoff_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_select_explicit_port() {
        let ports = vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()];
        let chosen = select_port(&ports, Some("/dev/ttyACM0")).unwrap();
        assert_eq!(chosen.as_deref(), Some("/dev/ttyACM0"));
    }

    #[test]
    fn test_select_single_port() {
        let ports = vec!["/dev/ttyUSB0".to_string()];
        assert_eq!(
            select_port(&ports, None).unwrap().as_deref(),
            Some("/dev/ttyUSB0")
        );
        assert_eq!(select_port(&[], None).unwrap(), None);
    }

    #[test]
    fn test_select_ambiguous_ports() {
        let ports = vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()];
        let err = select_port(&ports, None).unwrap_err();
        match err {
            ContractError::ConfigValidation { field, message } => {
                assert_eq!(field, "serial.port");
                assert!(message.contains("--port"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_after_bounded_attempts() {
        let mut listed = 0;
        let result: Result<(), _> = acquire_with(
            &quick_config(None, 3),
            || {
                listed += 1;
                Ok(Vec::new())
            },
            |_| Ok(()),
        );

        assert!(matches!(
            result,
            Err(ContractError::TransportNotFound { attempts: 3 })
        ));
        assert_eq!(listed, 3);
    }

    #[test]
    fn test_port_appearing_later_is_acquired() {
        let mut listed = 0;
        let opened = acquire_with(
            &quick_config(None, 5),
            || {
                listed += 1;
                if listed < 3 {
                    Ok(Vec::new())
                } else {
                    Ok(vec!["/dev/ttyUSB0".to_string()])
                }
            },
            |path| Ok(path.to_string()),
        )
        .unwrap();

        assert_eq!(opened, "/dev/ttyUSB0");
        assert_eq!(listed, 3);
    }

    #[test]
    fn test_explicit_port_open_failure_is_reported() {
        let mut opens = 0;
        let result: Result<(), _> = acquire_with(
            &quick_config(Some("/dev/ttyUSB9"), 2),
            || panic!("explicit port must not enumerate"),
            |path| {
                opens += 1;
                Err(ContractError::transport(path, "permission denied"))
            },
        );

        assert_eq!(opens, 2);
        assert!(matches!(result, Err(ContractError::Transport { .. })));
    }

    #[test]
    fn test_ambiguous_fails_without_retry() {
        let mut listed = 0;
        let result: Result<(), _> = acquire_with(
            &quick_config(None, 5),
            || {
                listed += 1;
                Ok(vec!["/dev/a".to_string(), "/dev/b".to_string()])
            },
            |_| Ok(()),
        );

        assert!(matches!(result, Err(ContractError::ConfigValidation { .. })));
        assert_eq!(listed, 1);
    }
}
