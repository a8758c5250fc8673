//! Length-prefixed bus frames for the TCP gateway.
//!
//! Each frame is a 4-byte big-endian length followed by a JSON
//! `{"topic": ..., "payload": ...}` object. The payload is the topic
//! message text, carried verbatim.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{SeatgateError, SeatgateResult};

/// Default upper bound on a single frame body.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// A topic message crossing the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusFrame {
    pub topic: String,
    pub payload: String,
}

impl BusFrame {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Write one frame and flush.
pub async fn write_frame<S>(stream: &mut S, frame: &BusFrame) -> SeatgateResult<()>
where
    S: AsyncWrite + Unpin,
{
    let json = serde_json::to_vec(frame)?;
    let len = u32::try_from(json.len())
        .map_err(|_| SeatgateError::Transport(format!("Frame too large: {}", json.len())))?;

    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| SeatgateError::Transport(format!("Write error: {}", e)))?;
    stream
        .write_all(&json)
        .await
        .map_err(|e| SeatgateError::Transport(format!("Write error: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| SeatgateError::Transport(format!("Flush error: {}", e)))?;

    Ok(())
}

/// Read one frame. Returns `Ok(None)` when the peer closed cleanly between frames.
pub async fn read_frame<S>(stream: &mut S, max_frame_size: usize) -> SeatgateResult<Option<BusFrame>>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(SeatgateError::Transport(format!("Read error: {}", e))),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_frame_size {
        return Err(SeatgateError::Transport(format!(
            "Frame too large: {} > {}",
            len, max_frame_size
        )));
    }

    let mut body = vec![0u8; len];
    stream
        .read_exact(&mut body)
        .await
        .map_err(|e| SeatgateError::Transport(format!("Read error: {}", e)))?;

    Ok(Some(serde_json::from_slice(&body)?))
}
