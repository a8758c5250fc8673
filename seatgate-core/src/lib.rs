//! # seatgate-core
//!
//! Core library for seatgate, a signal-gated seat command mediator.
//!
//! This crate provides the bus message contracts, the vehicle signal
//! model, the actuation gate policy, the error taxonomy and the frame
//! codec shared by the mediator's TCP gateway and the client SDK.

pub mod error;
pub mod frame;
pub mod gate;
pub mod message;
pub mod signal;

pub use error::{Outcome, SeatgateError, SeatgateResult, STATUS_FAIL, STATUS_OK};
pub use frame::{read_frame, write_frame, BusFrame, DEFAULT_MAX_FRAME_SIZE};
pub use gate::{decide, GateDecision};
pub use message::{
    CommandRequest, CommandResponse, ResponseMessage, ResultStatus, StateUpdate, TOPIC_CURRENT_POSITION,
    TOPIC_REQUEST, TOPIC_REQUEST_RIGHT, TOPIC_RESPONSE,
};
pub use signal::{
    DataPoint, DataPointReply, SignalPath, SignalQuery, SignalValue, Status, SubscriptionEvent,
    DRIVER_SEAT_POSITION, PASSENGER_SEAT_POSITION, VEHICLE_SPEED,
};
