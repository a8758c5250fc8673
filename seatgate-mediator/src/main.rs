//! Seatgate mediator with an in-memory broker and a TCP bus gateway.

use std::sync::Arc;

use seatgate_core::SeatgateResult;
use seatgate_mediator::{
    Gateway, GatewayConfig, InMemoryBroker, LocalBus, Mediator, MediatorArgs, MediatorConfig,
};

#[tokio::main]
async fn main() -> SeatgateResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Parse command line args
    let args = MediatorArgs::parse(std::env::args().skip(1))?;

    let config = MediatorConfig::default().with_serialized_actuation(args.serialize_actuation);
    let bind_addr = args
        .bind_addr
        .unwrap_or_else(|| GatewayConfig::default().bind_addr);
    let gateway_config = GatewayConfig::with_addr(bind_addr).for_mediator(&config);

    let broker = Arc::new(InMemoryBroker::seat_defaults());
    let bus = Arc::new(LocalBus::new());

    tracing::info!(
        "Starting seatgate mediator (serialized actuation: {})",
        config.serialize_actuation
    );

    let running = Mediator::new(config, broker, bus.clone()).start()?;
    let gateway = Gateway::new(gateway_config, bus);

    tokio::select! {
        _ = running.run() => {
            tracing::warn!("Mediator stopped");
            Ok(())
        }
        result = gateway.run() => result,
    }
}
