//! State change notifier: mirrors a signal onto a bus topic.

use bytes::Bytes;
use std::sync::Arc;

use seatgate_core::{DataPointReply, SignalPath, StateUpdate};

use crate::bus::MessageBus;

pub struct StateChangeNotifier {
    bus: Arc<dyn MessageBus>,
    signal: SignalPath,
    topic: String,
}

impl StateChangeNotifier {
    pub fn new(bus: Arc<dyn MessageBus>, signal: SignalPath, topic: impl Into<String>) -> Self {
        Self {
            bus,
            signal,
            topic: topic.into(),
        }
    }

    /// Build the state update for one subscription reply.
    pub fn state_update(&self, update: &DataPointReply) -> StateUpdate {
        let extracted = update.get_i64(&self.signal);
        if let Err(ref e) = extracted {
            tracing::warn!("Unable to get current value of {}: {}", self.signal, e);
        }
        StateUpdate::from(extracted)
    }

    /// Publish exactly one state message for `update`.
    pub fn on_signal_changed(&self, update: &DataPointReply) {
        let state = self.state_update(update);
        let payload = match state.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize state update: {}", e);
                StateUpdate::error(e.to_string())
                    .to_json()
                    .unwrap_or_else(|_| String::from(r#"{"status":1}"#))
            }
        };

        tracing::debug!("State update on {}: {}", self.topic, payload);
        if let Err(e) = self.bus.publish(&self.topic, Bytes::from(payload)) {
            tracing::error!("Failed to publish state update on {}: {}", self.topic, e);
        }
    }
}
