//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Data Flow
//! `ByteStream::read_chunk` -> `ProtocolParser::parse` -> `RecordSink::append` -> `RecordSink::commit`

mod blueprint;
mod cancel;
mod error;
mod record;
mod sink;
mod stream;

pub use blueprint::*;
pub use cancel::CancellationToken;
pub use error::*;
pub use record::*;
pub use sink::RecordSink;
pub use stream::{ByteStream, StreamChunk};
