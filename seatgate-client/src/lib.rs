//! Seatgate client SDK - talks to the mediator's bus gateway.
//!
//! # Example
//!
//! ```no_run
//! use seatgate_client::{Seat, SeatClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = SeatClient::connect("127.0.0.1:1883").await?;
//!
//!     let response = client.set_position(Seat::Driver, 300).await?;
//!     println!("Response: {}", response.message());
//!
//!     Ok(())
//! }
//! ```

mod connection;

pub use connection::{Connection, ConnectionConfig};

use std::collections::VecDeque;
use std::net::SocketAddr;

use seatgate_core::{
    BusFrame, CommandRequest, ResponseMessage, SeatgateError, SeatgateResult, StateUpdate,
    TOPIC_CURRENT_POSITION, TOPIC_REQUEST, TOPIC_REQUEST_RIGHT, TOPIC_RESPONSE,
};

/// Front row seat addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Driver,
    Passenger,
}

impl Seat {
    pub fn request_topic(&self) -> &'static str {
        match self {
            Self::Driver => TOPIC_REQUEST,
            Self::Passenger => TOPIC_REQUEST_RIGHT,
        }
    }

    /// Topic mirroring this seat's position, if the mediator mirrors it.
    ///
    /// Only the driver seat is mirrored; a passenger request gets a response
    /// but no state update.
    pub fn mirror_topic(&self) -> Option<&'static str> {
        match self {
            Self::Driver => Some(TOPIC_CURRENT_POSITION),
            Self::Passenger => None,
        }
    }
}

impl std::str::FromStr for Seat {
    type Err = SeatgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" | "left" => Ok(Self::Driver),
            "passenger" | "right" => Ok(Self::Passenger),
            other => Err(SeatgateError::Validation {
                request_id: None,
                message: format!("Unknown seat {}: expected driver/left or passenger/right", other),
            }),
        }
    }
}

/// High-level seatgate client.
pub struct SeatClient {
    connection: Connection,
    next_request_id: i64,
    pending_states: VecDeque<StateUpdate>,
}

impl SeatClient {
    /// Connect to a gateway.
    pub async fn connect(addr: impl AsRef<str>) -> SeatgateResult<Self> {
        let addr: SocketAddr = addr
            .as_ref()
            .parse()
            .map_err(|e| SeatgateError::Transport(format!("Invalid address: {}", e)))?;

        let connection = Connection::connect(&ConnectionConfig::new(addr)).await?;
        Ok(Self {
            connection,
            next_request_id: 1,
            pending_states: VecDeque::new(),
        })
    }

    /// Request a seat position, using the next request id.
    pub async fn set_position(&mut self, seat: Seat, position: i64) -> SeatgateResult<ResponseMessage> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let payload = serde_json::to_string(&CommandRequest::new(request_id, position))?;
        self.send_request(seat.request_topic(), request_id, payload).await
    }

    /// Send a raw request payload and wait for the response carrying `request_id`.
    ///
    /// State updates received meanwhile are kept for [`SeatClient::next_state_update`];
    /// responses to other requests are skipped.
    pub async fn send_request(
        &mut self,
        topic: &str,
        request_id: i64,
        payload: impl Into<String>,
    ) -> SeatgateResult<ResponseMessage> {
        self.connection.publish(topic, payload).await?;

        loop {
            let frame = self.connection.recv().await?;
            match frame.topic.as_str() {
                TOPIC_RESPONSE => {
                    let response: ResponseMessage = serde_json::from_str(&frame.payload)?;
                    if response.request_id() == Some(request_id) {
                        return Ok(response);
                    }
                    tracing::debug!("Skipping response for request {:?}", response.request_id());
                }
                TOPIC_CURRENT_POSITION => self.buffer_state(&frame)?,
                other => tracing::debug!("Ignoring frame on {}", other),
            }
        }
    }

    /// Next state-mirror message, buffered or freshly received.
    pub async fn next_state_update(&mut self) -> SeatgateResult<StateUpdate> {
        if let Some(state) = self.pending_states.pop_front() {
            return Ok(state);
        }
        loop {
            let frame = self.connection.recv().await?;
            if frame.topic == TOPIC_CURRENT_POSITION {
                return Ok(serde_json::from_str(&frame.payload)?);
            }
        }
    }

    fn buffer_state(&mut self, frame: &BusFrame) -> SeatgateResult<()> {
        self.pending_states.push_back(serde_json::from_str(&frame.payload)?);
        Ok(())
    }
}
