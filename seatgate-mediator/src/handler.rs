//! Command ingress: parse, gate, actuate, respond.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use seatgate_core::{
    decide, CommandRequest, CommandResponse, GateDecision, Outcome, SeatgateError, SeatgateResult,
    SignalPath,
};

use crate::actuator::Actuator;
use crate::broker::VehicleBroker;
use crate::correlator::ResponseCorrelator;

/// Per-target async locks held across gate check and write.
#[derive(Default)]
struct ActuationLocks {
    locks: Mutex<HashMap<SignalPath, Arc<tokio::sync::Mutex<()>>>>,
}

impl ActuationLocks {
    fn for_target(&self, target: &SignalPath) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(target.clone())
            .or_default()
            .clone()
    }
}

/// Handles set-position commands for any number of target signals.
///
/// Without serialization, concurrent commands on one target may both read
/// the same gating value and both actuate; writes then race at the broker.
pub struct CommandHandler {
    broker: Arc<dyn VehicleBroker>,
    actuator: Actuator,
    correlator: ResponseCorrelator,
    gating_signal: SignalPath,
    locks: Option<ActuationLocks>,
}

impl CommandHandler {
    pub fn new(
        broker: Arc<dyn VehicleBroker>,
        correlator: ResponseCorrelator,
        gating_signal: SignalPath,
    ) -> Self {
        Self {
            actuator: Actuator::new(Arc::clone(&broker)),
            broker,
            correlator,
            gating_signal,
            locks: None,
        }
    }

    /// Serialize gate-check-then-write per target signal.
    pub fn serialized(mut self) -> Self {
        self.locks = Some(ActuationLocks::default());
        self
    }

    /// Handle one raw bus message addressed to `target`.
    ///
    /// Publishes exactly one response unless the payload is malformed, in
    /// which case nothing can be correlated and the message is dropped.
    pub async fn handle(&self, raw: &[u8], target: &SignalPath) -> Option<CommandResponse> {
        tracing::debug!("position request: \"{}\"", String::from_utf8_lossy(raw));

        let response = match self.mediate(raw, target).await {
            Ok(response) => response,
            Err(e) => match CommandResponse::from_error(None, &e) {
                Some(response) => {
                    tracing::error!("{}", response.message);
                    response
                }
                None => {
                    tracing::error!("Dropping request for {}: {}", target, e);
                    return None;
                }
            },
        };

        if response.outcome.is_success() {
            tracing::info!("{}", response.message);
        }
        self.correlator.respond(&response);
        Some(response)
    }

    /// Run one mediation cycle. `Err` only for failures that precede a request id.
    async fn mediate(&self, raw: &[u8], target: &SignalPath) -> SeatgateResult<CommandResponse> {
        // Parse and validate; malformed payloads return early without an id
        let request = CommandRequest::parse(raw)?;
        let request_id = Some(request.request_id);

        // Hold the target lock until the write completes, if serialized
        let _guard = match &self.locks {
            Some(locks) => Some(locks.for_target(target).lock_owned().await),
            None => None,
        };

        // Fresh gating read, then at most one write
        let result = self.gate_and_actuate(&request, target).await;

        // Every outcome past parsing maps to one correlated response
        Ok(match result {
            Ok(()) => CommandResponse::new(
                request_id,
                Outcome::Success,
                format!("Set Seat position to: {}", request.desired_value),
            ),
            Err(e) => match CommandResponse::from_error(request_id, &e) {
                Some(response) => response,
                None => CommandResponse::new(request_id, Outcome::ActuationFailed, e.detail()),
            },
        })
    }

    async fn gate_and_actuate(&self, request: &CommandRequest, target: &SignalPath) -> SeatgateResult<()> {
        let gating_value = self.broker.read(&self.gating_signal).await.map_err(|e| {
            SeatgateError::GateDenied(format!(
                "Not allowed to move seat because vehicle speed is unavailable: {}",
                e.detail()
            ))
        })?;

        match decide(gating_value, request.desired_value) {
            GateDecision::Allow => self.actuator.write(target, request.desired_value).await,
            GateDecision::Deny(reason) => {
                tracing::info!("{}", reason);
                Err(SeatgateError::GateDenied(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use crate::bus::{LocalBus, MessageBus};
    use seatgate_core::{SignalValue, DRIVER_SEAT_POSITION, TOPIC_RESPONSE, VEHICLE_SPEED};

    struct Fixture {
        broker: Arc<InMemoryBroker>,
        bus: Arc<LocalBus>,
        handler: CommandHandler,
    }

    fn fixture(speed: SignalValue) -> Fixture {
        let broker = Arc::new(InMemoryBroker::seat_defaults().with_signal(VEHICLE_SPEED, speed));
        let bus = Arc::new(LocalBus::new());
        let correlator = ResponseCorrelator::new(bus.clone(), TOPIC_RESPONSE);
        let handler = CommandHandler::new(broker.clone(), correlator, VEHICLE_SPEED.into());
        Fixture {
            broker,
            bus,
            handler,
        }
    }

    fn seat() -> SignalPath {
        DRIVER_SEAT_POSITION.into()
    }

    #[tokio::test]
    async fn stationary_vehicle_actuates_once() {
        let f = fixture(SignalValue::Int(0));
        let resp = f
            .handler
            .handle(br#"{"requestId":1,"position":5}"#, &seat())
            .await
            .unwrap();

        assert!(resp.outcome.is_success());
        assert_eq!(resp.request_id, Some(1));
        assert_eq!(resp.message, "Set Seat position to: 5");
        assert_eq!(f.broker.writes(), vec![(seat(), SignalValue::Int(5))]);
    }

    #[tokio::test]
    async fn moving_vehicle_never_actuates() {
        let f = fixture(SignalValue::Int(30));
        let resp = f
            .handler
            .handle(br#"{"requestId":2,"position":5}"#, &seat())
            .await
            .unwrap();

        assert_eq!(resp.outcome, Outcome::GateDenied);
        assert!(!resp.outcome.is_success());
        assert_eq!(
            resp.message,
            "Not allowed to move seat because vehicle speed is 30 and not 0"
        );
        assert!(f.broker.writes().is_empty());
    }

    #[tokio::test]
    async fn missing_position_is_validation_error() {
        let f = fixture(SignalValue::Int(0));
        let resp = f.handler.handle(br#"{"requestId":3}"#, &seat()).await.unwrap();

        assert_eq!(resp.outcome, Outcome::ValidationError);
        assert_eq!(resp.request_id, Some(3));
        assert_eq!(resp.message, "No position specified");
        assert!(f.broker.writes().is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let f = fixture(SignalValue::Int(0));
        let resp = f
            .handler
            .handle(br#"{"requestId":4,"position":4000}"#, &seat())
            .await
            .unwrap();

        assert_eq!(resp.outcome, Outcome::ActuationFailed);
        assert_eq!(resp.request_id, Some(4));
        assert!(resp.message.contains("out of range"));
    }

    #[tokio::test]
    async fn unreadable_gate_denies() {
        let broker = Arc::new(InMemoryBroker::new().with_signal(DRIVER_SEAT_POSITION, SignalValue::Int(0)));
        let bus = Arc::new(LocalBus::new());
        let handler = CommandHandler::new(
            broker.clone(),
            ResponseCorrelator::new(bus, TOPIC_RESPONSE),
            VEHICLE_SPEED.into(),
        );

        let resp = handler
            .handle(br#"{"requestId":5,"position":10}"#, &seat())
            .await
            .unwrap();
        assert_eq!(resp.outcome, Outcome::GateDenied);
        assert!(resp.message.contains("unavailable"));
        assert!(broker.writes().is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_dropped() {
        let f = fixture(SignalValue::Int(0));
        let mut responses = f.bus.subscribe(TOPIC_RESPONSE);

        assert!(f.handler.handle(b"position=5", &seat()).await.is_none());

        drop(f.handler);
        drop(f.bus);
        assert!(responses.next().await.is_none());
    }

    #[tokio::test]
    async fn each_request_publishes_one_response() {
        let f = fixture(SignalValue::Int(0));
        let mut responses = f.bus.subscribe(TOPIC_RESPONSE);

        f.handler.handle(br#"{"requestId":10,"position":1}"#, &seat()).await;
        f.handler.handle(br#"{"requestId":11}"#, &seat()).await;

        let first = responses.next().await.unwrap().unwrap();
        let second = responses.next().await.unwrap().unwrap();
        assert!(first.payload_str().starts_with(r#"{"requestId":10,"#));
        assert!(second.payload_str().starts_with(r#"{"requestId":11,"#));

        drop(f.handler);
        drop(f.bus);
        assert!(responses.next().await.is_none());
    }

    #[tokio::test]
    async fn serialized_handler_actuates_every_allowed_request() {
        let f = fixture(SignalValue::Int(0));
        let handler = Arc::new(f.handler.serialized());

        let mut tasks = Vec::new();
        for (id, position) in [(20, 100), (21, 200), (22, 300)] {
            let handler = Arc::clone(&handler);
            tasks.push(tokio::spawn(async move {
                let raw = format!(r#"{{"requestId":{},"position":{}}}"#, id, position);
                handler.handle(raw.as_bytes(), &seat()).await
            }));
        }
        for task in tasks {
            let resp = task.await.unwrap().unwrap();
            assert_eq!(resp.outcome, Outcome::Success);
        }
        assert_eq!(f.broker.writes().len(), 3);
    }
}
