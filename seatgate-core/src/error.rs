//! Error types and outcome codes for seatgate.

use thiserror::Error;

/// Wire status code for a successful command.
pub const STATUS_OK: u8 = 0;
/// Wire status code for any failed command or unreadable state.
pub const STATUS_FAIL: u8 = 1;

/// How a single command mediation cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// A required field was missing or had the wrong type.
    ValidationError,
    /// The gating precondition was not met.
    GateDenied,
    /// The broker rejected or failed the write.
    ActuationFailed,
    /// The target signal was written.
    Success,
}

impl Outcome {
    /// Status code carried on the wire for this outcome.
    pub fn status(&self) -> u8 {
        match self {
            Self::Success => STATUS_OK,
            Self::ValidationError | Self::GateDenied | Self::ActuationFailed => STATUS_FAIL,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationError => write!(f, "validation_error"),
            Self::GateDenied => write!(f, "gate_denied"),
            Self::ActuationFailed => write!(f, "actuation_failed"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Seatgate errors.
#[derive(Debug, Error)]
pub enum SeatgateError {
    /// Payload could not be parsed at all; no request id is recoverable.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A required field is missing or has the wrong type.
    #[error("validation error: {message}")]
    Validation {
        request_id: Option<i64>,
        message: String,
    },

    /// The gating precondition refused the command.
    #[error("gate denied: {0}")]
    GateDenied(String),

    /// The actuation write failed at the broker.
    #[error("actuation failed: {0}")]
    ActuationFailed(String),

    /// Broker or bus delivery failure on a subscription.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// Broker-level read/write error.
    #[error("broker error: {0}")]
    Broker(String),

    /// The requested signal is not present in a reply.
    #[error("signal {path} not present in reply")]
    SignalUnavailable { path: String },

    /// The signal carries a value of an unexpected type.
    #[error("signal {path} has non-integer value {value}")]
    TypeMismatch { path: String, value: String },

    /// Transport error (connection, I/O, framing).
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SeatgateError {
    /// Text used in a response message for this error, without the category prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::MalformedMessage(msg)
            | Self::GateDenied(msg)
            | Self::ActuationFailed(msg)
            | Self::Subscription(msg)
            | Self::Broker(msg)
            | Self::Transport(msg) => msg.clone(),
            Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for seatgate operations.
pub type SeatgateResult<T> = Result<T, SeatgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_status_codes() {
        assert_eq!(Outcome::Success.status(), 0);
        assert_eq!(Outcome::ValidationError.status(), 1);
        assert_eq!(Outcome::GateDenied.status(), 1);
        assert_eq!(Outcome::ActuationFailed.status(), 1);
        assert!(Outcome::Success.is_success());
        assert!(!Outcome::GateDenied.is_success());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::GateDenied.to_string(), "gate_denied");
        assert_eq!(Outcome::ActuationFailed.to_string(), "actuation_failed");
    }

    #[test]
    fn detail_strips_category() {
        let err = SeatgateError::Broker("write rejected".to_string());
        assert_eq!(err.to_string(), "broker error: write rejected");
        assert_eq!(err.detail(), "write rejected");

        let err = SeatgateError::SignalUnavailable {
            path: "Vehicle.Speed".to_string(),
        };
        assert_eq!(err.detail(), "signal Vehicle.Speed not present in reply");
    }
}
