//! Replay stream - re-ingests a captured serial log
//!
//! Reads a file written by a serial terminal (or by `line-telemetry simulate`)
//! in fixed-size chunks, so chunk boundaries fall mid-line exactly like
//! on a real port.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use contracts::{ByteStream, ContractError, StreamChunk};
use tracing::{debug, info};

/// Default bytes per replayed chunk
pub const DEFAULT_REPLAY_CHUNK_BYTES: usize = 256;

/// Replay stream
pub struct ReplayStream {
    name: String,
    file: Option<File>,
    buf: Vec<u8>,
    pace: Option<Duration>,
    bytes_read: u64,
}

impl ReplayStream {
    /// Open a capture file
    ///
    /// `pace` sleeps between chunks to emulate transport timing.
    pub fn open(
        path: &Path,
        chunk_bytes: usize,
        pace: Option<Duration>,
    ) -> Result<Self, ContractError> {
        let name = path.display().to_string();
        let file = File::open(path)
            .map_err(|e| ContractError::transport(&name, format!("cannot open capture: {e}")))?;

        info!(path = %name, chunk_bytes, "replaying capture");

        Ok(Self {
            name,
            file: Some(file),
            buf: vec![0u8; chunk_bytes.max(1)],
            pace,
            bytes_read: 0,
        })
    }

    /// Bytes replayed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl ByteStream for ReplayStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_chunk(&mut self) -> Result<StreamChunk, ContractError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(StreamChunk::Closed);
        };

        if let Some(pace) = self.pace {
            thread::sleep(pace);
        }

        loop {
            match file.read(&mut self.buf) {
                Ok(0) => return Ok(StreamChunk::Closed),
                Ok(n) => {
                    self.bytes_read += n as u64;
                    return Ok(StreamChunk::Data(Bytes::copy_from_slice(&self.buf[..n])));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ContractError::transport(&self.name, e.to_string())),
            }
        }
    }

    fn close(&mut self) -> Result<(), ContractError> {
        if self.file.take().is_some() {
            debug!(path = %self.name, bytes = self.bytes_read, "replay closed");
        }
        Ok(())
    }
}
