//! Response correlator: publishes exactly one response per command.

use bytes::Bytes;
use std::sync::Arc;

use seatgate_core::CommandResponse;

use crate::bus::MessageBus;

pub struct ResponseCorrelator {
    bus: Arc<dyn MessageBus>,
    topic: String,
}

impl ResponseCorrelator {
    pub fn new(bus: Arc<dyn MessageBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Serialize and publish a response. Fire-and-forget: failures are logged.
    pub fn respond(&self, response: &CommandResponse) {
        let payload = match response.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(
                    "Failed to serialize response for request {:?}: {}",
                    response.request_id,
                    e
                );
                return;
            }
        };

        tracing::debug!("Response on {}: {}", self.topic, payload);
        if let Err(e) = self.bus.publish(&self.topic, Bytes::from(payload)) {
            tracing::error!(
                "Failed to publish response for request {:?}: {}",
                response.request_id,
                e
            );
        }
    }
}
