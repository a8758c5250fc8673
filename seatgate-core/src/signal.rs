//! Vehicle signal model: paths, values, replies and subscription status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SeatgateError, SeatgateResult};

/// Vehicle speed, the gating signal.
pub const VEHICLE_SPEED: &str = "Vehicle.Speed";
/// Driver-side front row seat position.
pub const DRIVER_SEAT_POSITION: &str = "Vehicle.Cabin.Seat.Row1.DriverSide.Position";
/// Passenger-side front row seat position.
pub const PASSENGER_SEAT_POSITION: &str = "Vehicle.Cabin.Seat.Row1.PassengerSide.Position";

/// Dotted path naming a broker signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalPath(String);

impl SignalPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Current value of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl SignalValue {
    /// Integer view of the value; floats and booleans are not converted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(_) | Self::Bool(_) => None,
        }
    }

    /// Whether the value is exactly zero. NaN and booleans are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(v) => *v == 0,
            Self::Float(v) => *v == 0.0,
            Self::Bool(_) => false,
        }
    }
}

impl std::fmt::Display for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// A single signal sample as reported by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub path: SignalPath,
    pub value: SignalValue,
    pub timestamp: DateTime<Utc>,
}

impl DataPoint {
    pub fn now(path: SignalPath, value: SignalValue) -> Self {
        Self {
            path,
            value,
            timestamp: Utc::now(),
        }
    }
}

/// The set of changed signals delivered by one subscription update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPointReply {
    points: HashMap<SignalPath, DataPoint>,
}

impl DataPointReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_point(mut self, point: DataPoint) -> Self {
        self.insert(point);
        self
    }

    pub fn insert(&mut self, point: DataPoint) {
        self.points.insert(point.path.clone(), point);
    }

    /// Look up a signal in this reply.
    pub fn get(&self, path: &SignalPath) -> SeatgateResult<&DataPoint> {
        self.points
            .get(path)
            .ok_or_else(|| SeatgateError::SignalUnavailable {
                path: path.to_string(),
            })
    }

    /// Integer value of a signal in this reply.
    pub fn get_i64(&self, path: &SignalPath) -> SeatgateResult<i64> {
        let point = self.get(path)?;
        point.value.as_i64().ok_or_else(|| SeatgateError::TypeMismatch {
            path: path.to_string(),
            value: point.value.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Selection of signals a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalQuery {
    paths: Vec<SignalPath>,
}

impl SignalQuery {
    pub fn select(path: impl Into<SignalPath>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    pub fn and(mut self, path: impl Into<SignalPath>) -> Self {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
        self
    }

    pub fn paths(&self) -> &[SignalPath] {
        &self.paths
    }

    pub fn matches(&self, path: &SignalPath) -> bool {
        self.paths.contains(path)
    }
}

impl std::fmt::Display for SignalQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<&str> = self.paths.iter().map(SignalPath::as_str).collect();
        write!(f, "SELECT {}", paths.join(", "))
    }
}

/// Failure status delivered on a subscription channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    message: String,
}

impl Status {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn error_message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<Status> for SeatgateError {
    fn from(status: Status) -> Self {
        SeatgateError::Subscription(status.message)
    }
}

/// One item on a subscription channel: an update or the error that ended it.
pub type SubscriptionEvent<T> = Result<T, Status>;
