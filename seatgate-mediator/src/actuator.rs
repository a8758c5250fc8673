//! Actuator adapter: one write against the target signal, no retry.

use std::sync::Arc;

use seatgate_core::{SeatgateError, SeatgateResult, SignalPath, SignalValue};

use crate::broker::VehicleBroker;

pub struct Actuator {
    broker: Arc<dyn VehicleBroker>,
}

impl Actuator {
    pub fn new(broker: Arc<dyn VehicleBroker>) -> Self {
        Self { broker }
    }

    /// Write `value` to `target` and wait for the broker's acknowledgment.
    ///
    /// A failed write surfaces as [`SeatgateError::ActuationFailed`] with the
    /// broker's failure text; the caller must re-request explicitly.
    pub async fn write(&self, target: &SignalPath, value: i64) -> SeatgateResult<()> {
        tracing::debug!("Writing {} to {}", value, target);
        self.broker
            .write(target, SignalValue::Int(value))
            .await
            .map_err(|e| {
                tracing::error!("Actuation of {} failed: {}", target, e);
                SeatgateError::ActuationFailed(e.detail())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryBroker;
    use seatgate_core::DRIVER_SEAT_POSITION;

    #[tokio::test]
    async fn single_write_on_success() {
        let broker = Arc::new(InMemoryBroker::seat_defaults());
        let actuator = Actuator::new(broker.clone());

        actuator.write(&DRIVER_SEAT_POSITION.into(), 250).await.unwrap();
        assert_eq!(broker.writes().len(), 1);
    }

    #[tokio::test]
    async fn failure_is_not_retried() {
        let broker = Arc::new(InMemoryBroker::seat_defaults());
        broker.fail_writes(DRIVER_SEAT_POSITION, "motor overcurrent");
        let actuator = Actuator::new(broker.clone());

        let err = actuator.write(&DRIVER_SEAT_POSITION.into(), 250).await.unwrap_err();
        match err {
            SeatgateError::ActuationFailed(msg) => assert_eq!(msg, "motor overcurrent"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(broker.writes().is_empty());
    }
}
