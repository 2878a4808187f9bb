//! ByteStream trait - telemetry source abstraction
//!
//! Unifies the real serial port, the device simulator and log replay
//! behind one blocking read interface consumed by the ingestion loop.

use bytes::Bytes;

use crate::ContractError;

/// Result of one blocking read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Bytes received; may end in the middle of a line
    Data(Bytes),

    /// Read timeout elapsed without data
    Idle,

    /// The stream ended and will produce no more data
    Closed,
}

/// Byte stream trait
///
/// Reads are bounded by a timeout so the caller can re-check for
/// cancellation on a silent transport.
///
/// # Example
///
/// ```ignore
/// let mut stream: Box<dyn ByteStream> = acquire_transport(&config.serial)?;
/// loop {
///     match stream.read_chunk()? {
///         StreamChunk::Data(bytes) => framer.push(&bytes),
///         StreamChunk::Idle => continue,
///         StreamChunk::Closed => break,
///     }
/// }
/// stream.close()?;
/// ```
pub trait ByteStream: Send {
    /// Stream name (port path, "simulator", replay file)
    fn name(&self) -> &str;

    /// Block until data arrives, the timeout elapses, or the stream ends
    ///
    /// # Errors
    /// Returns `ContractError::Transport` when the underlying device fails
    fn read_chunk(&mut self) -> Result<StreamChunk, ContractError>;

    /// Release the underlying device
    ///
    /// Must be safe to call more than once.
    fn close(&mut self) -> Result<(), ContractError>;
}

impl<T: ByteStream + ?Sized> ByteStream for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_chunk(&mut self) -> Result<StreamChunk, ContractError> {
        (**self).read_chunk()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}
