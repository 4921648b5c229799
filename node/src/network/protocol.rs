// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Wire frames.
//!
//! Frames are length-delimited, bincode-encoded. A connection always starts
//! with `Hello` → `Welcome | Rejected` and ends with `Goodbye` → `GoodbyeAck`
//! (or the socket closing).

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use replay_kernel::event::EventLogEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Well-known name of the master's reporter endpoint.
pub const REPORTER_ENDPOINT_NAME: &str = "EventReporter";
pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(&'static str),

    #[error("Handshake rejected: {0}")]
    Rejected(String),

    #[error("Connection closed by peer")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    Hello { endpoint: String, protocol_version: u32 },
    Welcome,
    Rejected { reason: String },
    LogEvent(EventLogEntry),
    Goodbye,
    /// Sent once every earlier frame of the connection has reached the mailbox
    GoodbyeAck,
}

impl Frame {
    pub fn name(&self) -> &'static str {
        match self {
            Frame::Hello { .. } => "Hello",
            Frame::Welcome => "Welcome",
            Frame::Rejected { .. } => "Rejected",
            Frame::LogEvent(_) => "LogEvent",
            Frame::Goodbye => "Goodbye",
            Frame::GoodbyeAck => "GoodbyeAck",
        }
    }
}

pub type FramedStream = Framed<TcpStream, LengthDelimitedCodec>;

pub fn framed(stream: TcpStream) -> FramedStream {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_framed(stream)
}

pub fn encode_frame(frame: &Frame) -> Result<Bytes, WireError> {
    bincode::serde::encode_to_vec(frame, bincode::config::standard())
        .map(Bytes::from)
        .map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode_frame(bytes: &[u8]) -> Result<Frame, WireError> {
    bincode::serde::decode_from_slice::<Frame, _>(bytes, bincode::config::standard())
        .map(|(frame, _)| frame)
        .map_err(|e| WireError::Decode(e.to_string()))
}

pub async fn send_frame(stream: &mut FramedStream, frame: &Frame) -> Result<(), WireError> {
    stream.send(encode_frame(frame)?).await?;
    Ok(())
}

/// `Ok(None)` when the peer closed the connection cleanly.
pub async fn recv_frame(stream: &mut FramedStream) -> Result<Option<Frame>, WireError> {
    match stream.next().await {
        Some(Ok(bytes)) => decode_frame(&bytes).map(Some),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_kernel::types::{DatasetId, Partition};

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::LogEvent(EventLogEntry::ShuffleMapTaskChecksum {
            dataset_id: DatasetId(3),
            partition: Partition(1),
            hash: 0xDEAD_BEEF,
        });

        let bytes = encode_frame(&frame).unwrap();
        assert_eq!(decode_frame(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_garbage_does_not_decode() {
        assert!(matches!(decode_frame(&[0xFF, 0xFF, 0xFF]), Err(WireError::Decode(_))));
    }
}
