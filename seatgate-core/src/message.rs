//! Message bus payloads: command requests, correlated responses and state mirrors.
//!
//! Field names and shapes follow the seat adjuster topic contracts:
//!
//! - request: `{"requestId": 1, "position": 5}`
//! - response: `{"requestId": 1, "result": {"status": 0, "message": "..."}}`
//! - validation response: `{"requestId": 1, "status": 1, "message": "..."}`
//! - state mirror: `{"position": 5}` or `{"status": 1, "message": "..."}`

use serde::{Deserialize, Serialize};

use crate::error::{Outcome, SeatgateError, SeatgateResult, STATUS_FAIL};

/// Driver-side set-position requests.
pub const TOPIC_REQUEST: &str = "seatadjuster/setPosition/request";
/// Passenger-side set-position requests.
pub const TOPIC_REQUEST_RIGHT: &str = "seatadjuster/setPosition/requestRight";
/// Correlated responses to both request topics.
pub const TOPIC_RESPONSE: &str = "seatadjuster/setPosition/response";
/// Mirror of the driver seat position signal.
pub const TOPIC_CURRENT_POSITION: &str = "seatadjuster/currentPosition";

pub const FIELD_REQUEST_ID: &str = "requestId";
pub const FIELD_POSITION: &str = "position";

/// A validated set-position command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub request_id: i64,
    #[serde(rename = "position")]
    pub desired_value: i64,
}

impl CommandRequest {
    pub fn new(request_id: i64, desired_value: i64) -> Self {
        Self {
            request_id,
            desired_value,
        }
    }

    /// Parse and validate a raw request payload.
    ///
    /// Unparseable payloads (or payloads that are not JSON objects) yield
    /// [`SeatgateError::MalformedMessage`]. Missing or mistyped fields yield
    /// [`SeatgateError::Validation`] carrying whatever request id could be read.
    pub fn parse(raw: &[u8]) -> SeatgateResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(raw)
            .map_err(|e| SeatgateError::MalformedMessage(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            SeatgateError::MalformedMessage(format!("expected a JSON object, got {}", value))
        })?;

        let request_id = object.get(FIELD_REQUEST_ID).and_then(|v| v.as_i64());

        let position = match object.get(FIELD_POSITION) {
            None => {
                return Err(SeatgateError::Validation {
                    request_id,
                    message: "No position specified".to_string(),
                })
            }
            Some(position) => position.as_i64().ok_or_else(|| SeatgateError::Validation {
                request_id,
                message: format!("Invalid position {}: expected an integer", position),
            })?,
        };

        let request_id = request_id.ok_or_else(|| SeatgateError::Validation {
            request_id: None,
            message: "No valid requestId specified".to_string(),
        })?;

        Ok(Self::new(request_id, position))
    }
}

/// The single response produced for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub request_id: Option<i64>,
    pub outcome: Outcome,
    pub message: String,
}

impl CommandResponse {
    pub fn new(request_id: Option<i64>, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            request_id,
            outcome,
            message: message.into(),
        }
    }

    /// Build the response for a request-scoped error.
    ///
    /// Returns `None` for errors that cannot be correlated to a request.
    pub fn from_error(request_id: Option<i64>, error: &SeatgateError) -> Option<Self> {
        let (request_id, outcome) = match error {
            SeatgateError::Validation {
                request_id: parsed, ..
            } => (parsed.or(request_id), Outcome::ValidationError),
            SeatgateError::GateDenied(_) => (request_id, Outcome::GateDenied),
            SeatgateError::ActuationFailed(_) => (request_id, Outcome::ActuationFailed),
            _ => return None,
        };
        Some(Self::new(request_id, outcome, error.detail()))
    }

    /// Wire representation of this response.
    pub fn to_message(&self) -> ResponseMessage {
        let status = self.outcome.status();
        match self.outcome {
            Outcome::ValidationError => ResponseMessage::Flat {
                request_id: self.request_id,
                status,
                message: self.message.clone(),
            },
            _ => ResponseMessage::Result {
                request_id: self.request_id,
                result: ResultStatus {
                    status,
                    message: self.message.clone(),
                },
            },
        }
    }

    pub fn to_json(&self) -> SeatgateResult<String> {
        Ok(serde_json::to_string(&self.to_message())?)
    }
}

/// Status and message pair nested under `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStatus {
    pub status: u8,
    pub message: String,
}

/// Response payload as published on the response topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    Result {
        #[serde(rename = "requestId")]
        request_id: Option<i64>,
        result: ResultStatus,
    },
    Flat {
        #[serde(rename = "requestId")]
        request_id: Option<i64>,
        status: u8,
        message: String,
    },
}

impl ResponseMessage {
    pub fn request_id(&self) -> Option<i64> {
        match self {
            Self::Result { request_id, .. } | Self::Flat { request_id, .. } => *request_id,
        }
    }

    pub fn status(&self) -> u8 {
        match self {
            Self::Result { result, .. } => result.status,
            Self::Flat { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Result { result, .. } => &result.message,
            Self::Flat { message, .. } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == crate::error::STATUS_OK
    }
}

/// State-mirror payload for a signal change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateUpdate {
    Position { position: i64 },
    Error { status: u8, message: String },
}

impl StateUpdate {
    pub fn position(position: i64) -> Self {
        Self::Position { position }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            status: STATUS_FAIL,
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> SeatgateResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<SeatgateResult<i64>> for StateUpdate {
    fn from(extracted: SeatgateResult<i64>) -> Self {
        match extracted {
            Ok(position) => Self::position(position),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_request() {
        let req = CommandRequest::parse(br#"{"requestId":1,"position":5}"#).unwrap();
        assert_eq!(req, CommandRequest::new(1, 5));
    }

    #[test]
    fn parse_ignores_unknown_fields() {
        let req = CommandRequest::parse(br#"{"requestId":9,"position":300,"seat":"left"}"#).unwrap();
        assert_eq!(req.desired_value, 300);
    }

    #[test]
    fn parse_missing_position_keeps_request_id() {
        let err = CommandRequest::parse(br#"{"requestId":3}"#).unwrap_err();
        match err {
            SeatgateError::Validation {
                request_id,
                message,
            } => {
                assert_eq!(request_id, Some(3));
                assert_eq!(message, "No position specified");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_non_integer_position() {
        let err = CommandRequest::parse(br#"{"requestId":4,"position":"up"}"#).unwrap_err();
        assert!(matches!(
            err,
            SeatgateError::Validation {
                request_id: Some(4),
                ..
            }
        ));
    }

    #[test]
    fn parse_missing_request_id() {
        let err = CommandRequest::parse(br#"{"position":5}"#).unwrap_err();
        assert!(matches!(
            err,
            SeatgateError::Validation {
                request_id: None,
                ..
            }
        ));
    }

    #[test]
    fn parse_malformed() {
        assert!(matches!(
            CommandRequest::parse(b"{not json"),
            Err(SeatgateError::MalformedMessage(_))
        ));
        assert!(matches!(
            CommandRequest::parse(b"[1, 2]"),
            Err(SeatgateError::MalformedMessage(_))
        ));
    }

    #[test]
    fn success_response_shape() {
        let resp = CommandResponse::new(Some(1), Outcome::Success, "Set Seat position to: 5");
        assert_eq!(
            resp.to_json().unwrap(),
            r#"{"requestId":1,"result":{"status":0,"message":"Set Seat position to: 5"}}"#
        );
    }

    #[test]
    fn validation_response_is_flat() {
        let resp = CommandResponse::new(Some(3), Outcome::ValidationError, "No position specified");
        assert_eq!(
            resp.to_json().unwrap(),
            r#"{"requestId":3,"status":1,"message":"No position specified"}"#
        );

        let resp = CommandResponse::new(None, Outcome::ValidationError, "No position specified");
        assert_eq!(
            resp.to_json().unwrap(),
            r#"{"requestId":null,"status":1,"message":"No position specified"}"#
        );
    }

    #[test]
    fn response_message_parses_both_shapes() {
        let nested: ResponseMessage = serde_json::from_str(
            r#"{"requestId":2,"result":{"status":1,"message":"denied"}}"#,
        )
        .unwrap();
        assert_eq!(nested.request_id(), Some(2));
        assert_eq!(nested.status(), 1);
        assert_eq!(nested.message(), "denied");

        let flat: ResponseMessage =
            serde_json::from_str(r#"{"requestId":3,"status":1,"message":"No position specified"}"#)
                .unwrap();
        assert_eq!(flat.request_id(), Some(3));
        assert!(!flat.is_success());
    }

    #[test]
    fn from_error_keeps_parsed_request_id() {
        let err = SeatgateError::Validation {
            request_id: Some(8),
            message: "No position specified".to_string(),
        };
        let resp = CommandResponse::from_error(None, &err).unwrap();
        assert_eq!(resp.request_id, Some(8));
        assert_eq!(resp.outcome, Outcome::ValidationError);

        let err = SeatgateError::ActuationFailed("out of range".to_string());
        let resp = CommandResponse::from_error(Some(5), &err).unwrap();
        assert_eq!(resp.message, "out of range");

        let err = SeatgateError::MalformedMessage("eof".to_string());
        assert!(CommandResponse::from_error(None, &err).is_none());
    }

    #[test]
    fn state_update_shapes() {
        assert_eq!(StateUpdate::position(7).to_json().unwrap(), r#"{"position":7}"#);
        assert_eq!(
            StateUpdate::error("no value").to_json().unwrap(),
            r#"{"status":1,"message":"no value"}"#
        );

        let parsed: StateUpdate = serde_json::from_str(r#"{"position":12}"#).unwrap();
        assert_eq!(parsed, StateUpdate::position(12));
    }
}
