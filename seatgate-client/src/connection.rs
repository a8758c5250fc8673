//! TCP connection to a seatgate bus gateway.

use std::net::SocketAddr;
use tokio::net::TcpStream;

use seatgate_core::{read_frame, write_frame, BusFrame, SeatgateError, SeatgateResult, DEFAULT_MAX_FRAME_SIZE};

/// Client connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Gateway address.
    pub gateway_addr: SocketAddr,
    /// Max frame size.
    pub max_frame_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            gateway_addr: SocketAddr::from(([127, 0, 0, 1], 1883)),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            gateway_addr: addr,
            ..Default::default()
        }
    }
}

/// Framed connection to the gateway.
pub struct Connection {
    stream: TcpStream,
    max_frame_size: usize,
}

impl Connection {
    /// Connect to the gateway.
    pub async fn connect(config: &ConnectionConfig) -> SeatgateResult<Self> {
        let stream = TcpStream::connect(&config.gateway_addr)
            .await
            .map_err(|e| SeatgateError::Transport(format!("Connection failed: {}", e)))?;

        Ok(Self {
            stream,
            max_frame_size: config.max_frame_size,
        })
    }

    /// Publish a payload on a topic through the gateway.
    pub async fn publish(&mut self, topic: &str, payload: impl Into<String>) -> SeatgateResult<()> {
        write_frame(&mut self.stream, &BusFrame::new(topic, payload)).await
    }

    /// Receive the next forwarded frame.
    pub async fn recv(&mut self) -> SeatgateResult<BusFrame> {
        read_frame(&mut self.stream, self.max_frame_size)
            .await?
            .ok_or_else(|| SeatgateError::Transport("Gateway closed the connection".to_string()))
    }
}
