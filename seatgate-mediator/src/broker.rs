//! Vehicle signal broker capability and an in-memory implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use seatgate_core::{
    DataPoint, DataPointReply, SeatgateError, SeatgateResult, SignalPath, SignalQuery, SignalValue,
    Status,
};

use crate::subscription::{SubscriberSet, SubscriptionHandle};

/// Signal broker as consumed by the mediator.
#[async_trait]
pub trait VehicleBroker: Send + Sync {
    /// Read the current value of a signal.
    async fn read(&self, path: &SignalPath) -> SeatgateResult<SignalValue>;

    /// Write a target value and wait for the broker's acknowledgment.
    async fn write(&self, path: &SignalPath, value: SignalValue) -> SeatgateResult<()>;

    /// Subscribe to changes of the queried signals.
    fn subscribe(&self, query: &SignalQuery) -> SeatgateResult<SubscriptionHandle<DataPointReply>>;
}

/// In-process broker holding signal values in memory.
///
/// Writes are checked against optional per-signal bounds and notify every
/// subscription whose query selects the written signal.
#[derive(Default)]
pub struct InMemoryBroker {
    values: RwLock<HashMap<SignalPath, DataPoint>>,
    bounds: RwLock<HashMap<SignalPath, (i64, i64)>>,
    write_failures: RwLock<HashMap<SignalPath, String>>,
    write_log: RwLock<Vec<(SignalPath, SignalValue)>>,
    subscribers: SubscriberSet<SignalQuery, DataPointReply>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat adjuster defaults: stationary vehicle, both front seats at 0 with range 0..=1000.
    pub fn seat_defaults() -> Self {
        Self::new()
            .with_signal(seatgate_core::VEHICLE_SPEED, SignalValue::Float(0.0))
            .with_signal(seatgate_core::DRIVER_SEAT_POSITION, SignalValue::Int(0))
            .with_signal(seatgate_core::PASSENGER_SEAT_POSITION, SignalValue::Int(0))
            .with_bounds(seatgate_core::DRIVER_SEAT_POSITION, 0, 1000)
            .with_bounds(seatgate_core::PASSENGER_SEAT_POSITION, 0, 1000)
    }

    /// Seed a signal value without notifying subscribers.
    pub fn with_signal(self, path: impl Into<SignalPath>, value: SignalValue) -> Self {
        let path = path.into();
        self.values
            .write()
            .insert(path.clone(), DataPoint::now(path, value));
        self
    }

    /// Restrict integer writes to `min..=max`.
    pub fn with_bounds(self, path: impl Into<SignalPath>, min: i64, max: i64) -> Self {
        self.bounds.write().insert(path.into(), (min, max));
        self
    }

    /// Update a signal from the vehicle side, notifying subscribers.
    pub fn set(&self, path: impl Into<SignalPath>, value: SignalValue) {
        let point = DataPoint::now(path.into(), value);
        self.values.write().insert(point.path.clone(), point.clone());
        self.notify(point);
    }

    /// Make every following write to `path` fail with `message`.
    pub fn fail_writes(&self, path: impl Into<SignalPath>, message: impl Into<String>) {
        self.write_failures.write().insert(path.into(), message.into());
    }

    /// Deliver `status` to every subscription selecting `path`, ending them.
    pub fn fail_subscriptions(&self, path: impl Into<SignalPath>, status: Status) -> usize {
        let path = path.into();
        self.subscribers.fail(|query| query.matches(&path), &status)
    }

    /// Acknowledged writes, in order.
    pub fn writes(&self) -> Vec<(SignalPath, SignalValue)> {
        self.write_log.read().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn check_bounds(&self, path: &SignalPath, value: &SignalValue) -> SeatgateResult<()> {
        let Some(&(min, max)) = self.bounds.read().get(path) else {
            return Ok(());
        };
        match value.as_i64() {
            Some(v) if v >= min && v <= max => Ok(()),
            Some(v) => Err(SeatgateError::Broker(format!(
                "Value {} out of range [{}, {}] for {}",
                v, min, max, path
            ))),
            None => Err(SeatgateError::Broker(format!(
                "Value {} has wrong type for {}",
                value, path
            ))),
        }
    }

    fn notify(&self, point: DataPoint) {
        let delivered = self.subscribers.deliver(|query| {
            query
                .matches(&point.path)
                .then(|| DataPointReply::new().with_point(point.clone()))
        });
        tracing::trace!("Notified {} subscriptions of {}", delivered, point.path);
    }
}

#[async_trait]
impl VehicleBroker for InMemoryBroker {
    async fn read(&self, path: &SignalPath) -> SeatgateResult<SignalValue> {
        self.values
            .read()
            .get(path)
            .map(|point| point.value)
            .ok_or_else(|| SeatgateError::Broker(format!("Signal {} has no value", path)))
    }

    async fn write(&self, path: &SignalPath, value: SignalValue) -> SeatgateResult<()> {
        if let Some(message) = self.write_failures.read().get(path) {
            return Err(SeatgateError::Broker(message.clone()));
        }
        self.check_bounds(path, &value)?;

        self.write_log.write().push((path.clone(), value));
        self.set(path.clone(), value);
        Ok(())
    }

    fn subscribe(&self, query: &SignalQuery) -> SeatgateResult<SubscriptionHandle<DataPointReply>> {
        if query.paths().is_empty() {
            return Err(SeatgateError::Subscription("Empty signal query".to_string()));
        }
        Ok(self.subscribers.register(query.clone(), query.to_string()))
    }
}
