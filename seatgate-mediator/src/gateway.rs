//! TCP gateway exposing the in-process bus to external peers.

use bytes::Bytes;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};

use seatgate_core::{read_frame, write_frame, BusFrame, SeatgateError, SeatgateResult};

use crate::bus::{BusMessage, MessageBus};
use crate::config::GatewayConfig;

/// Bus gateway server.
pub struct Gateway {
    config: GatewayConfig,
    bus: Arc<dyn MessageBus>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, bus: Arc<dyn MessageBus>) -> Self {
        Self { config, bus }
    }

    /// Bind the listener. Split from [`Gateway::serve`] so callers can learn the port.
    pub async fn bind(&self) -> SeatgateResult<TcpListener> {
        TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(|e| SeatgateError::Transport(format!("Failed to bind: {}", e)))
    }

    /// Bind and serve forever.
    pub async fn run(self) -> SeatgateResult<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept peers on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> SeatgateResult<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| SeatgateError::Transport(format!("No local address: {}", e)))?;
        tracing::info!("Bus gateway listening on {}", local_addr);

        loop {
            let (stream, addr) = listener
                .accept()
                .await
                .map_err(|e| SeatgateError::Transport(format!("Accept failed: {}", e)))?;

            tracing::debug!("Connection from {}", addr);

            let bus = Arc::clone(&self.bus);
            let config = self.config.clone();

            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, config, bus).await {
                    tracing::error!("Connection error from {}: {}", addr, e);
                }
            });
        }
    }

    /// Publish inbound frames; forward outbound topics until the peer leaves.
    ///
    /// A peer whose outbound queue fills up is disconnected.
    async fn handle_connection(
        stream: TcpStream,
        config: GatewayConfig,
        bus: Arc<dyn MessageBus>,
    ) -> SeatgateResult<()> {
        let (mut reader, mut writer) = stream.into_split();
        let (tx, mut rx) = mpsc::channel::<BusFrame>(config.outbound_capacity);
        let overflow = Arc::new(Notify::new());

        // Subscribe before reading so responses to the first request are not missed
        let mut forwarders = tokio::task::JoinSet::new();
        for topic in &config.outbound_topics {
            let mut handle = bus.subscribe(topic);
            let tx = tx.clone();
            let overflow = Arc::clone(&overflow);
            forwarders.spawn(async move {
                while let Some(event) = handle.next().await {
                    match event {
                        Ok(message) => {
                            if !enqueue(&tx, &message) {
                                overflow.notify_one();
                                return;
                            }
                        }
                        Err(status) => {
                            tracing::warn!("Outbound topic {} ended: {}", handle.source(), status)
                        }
                    }
                }
            });
        }
        drop(tx);

        // Drain queued frames to the peer
        let writer_task = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = write_frame(&mut writer, &frame).await {
                    tracing::debug!("Peer write failed: {}", e);
                    break;
                }
            }
        });

        let result = loop {
            let next = tokio::select! {
                read = read_frame(&mut reader, config.max_frame_size) => read,
                _ = overflow.notified() => {
                    break Err(SeatgateError::Transport(
                        "Peer is not keeping up with outbound frames".to_string(),
                    ));
                }
            };

            match next {
                Ok(Some(frame)) => {
                    // Inbound frames go straight onto the bus
                    tracing::debug!("Inbound frame on {}", frame.topic);
                    if let Err(e) = bus.publish(&frame.topic, Bytes::from(frame.payload)) {
                        tracing::error!("Failed to publish inbound frame: {}", e);
                    }
                }
                Ok(None) => {
                    tracing::debug!("Peer disconnected");
                    break Ok(());
                }
                Err(e) => break Err(e),
            }
        };

        // Tear down forwarding for this peer
        forwarders.shutdown().await;
        writer_task.abort();
        result
    }
}

/// Queue a frame for a peer. Returns `false` once the queue is full or closed.
fn enqueue(tx: &mpsc::Sender<BusFrame>, message: &BusMessage) -> bool {
    let frame = BusFrame::new(message.topic.clone(), message.payload_str());
    match tx.try_send(frame) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!("Outbound queue full, dropping peer (topic {})", message.topic);
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(payload: &'static str) -> BusMessage {
        BusMessage {
            topic: "seatadjuster/currentPosition".to_string(),
            payload: Bytes::from_static(payload.as_bytes()),
        }
    }

    #[tokio::test]
    async fn full_queue_rejects_frame() {
        let (tx, mut rx) = mpsc::channel(1);

        assert!(enqueue(&tx, &message(r#"{"position":1}"#)));
        assert!(!enqueue(&tx, &message(r#"{"position":2}"#)));

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.payload, r#"{"position":1}"#);
    }

    #[tokio::test]
    async fn closed_queue_rejects_frame() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        assert!(!enqueue(&tx, &message(r#"{"position":1}"#)));
    }
}
