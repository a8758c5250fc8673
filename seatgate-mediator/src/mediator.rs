//! The mediator: wires subscriptions to the ingress handler and notifiers.

use std::sync::Arc;
use tokio::task::JoinSet;

use seatgate_core::{DataPointReply, SeatgateResult, SignalPath, SignalQuery};

use crate::broker::VehicleBroker;
use crate::bus::{BusMessage, MessageBus};
use crate::config::MediatorConfig;
use crate::correlator::ResponseCorrelator;
use crate::handler::CommandHandler;
use crate::notifier::StateChangeNotifier;
use crate::reporter::{ErrorContext, ErrorReporter};
use crate::subscription::{dispatch, SubscriptionHandle};

/// Signal-gated command mediator.
///
/// Broker and bus are injected so either can be replaced by a fake.
pub struct Mediator {
    config: MediatorConfig,
    broker: Arc<dyn VehicleBroker>,
    bus: Arc<dyn MessageBus>,
    reporter: Arc<ErrorReporter>,
}

impl Mediator {
    pub fn new(config: MediatorConfig, broker: Arc<dyn VehicleBroker>, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            config,
            broker,
            bus,
            reporter: Arc::new(ErrorReporter::new()),
        }
    }

    pub fn reporter(&self) -> Arc<ErrorReporter> {
        Arc::clone(&self.reporter)
    }

    /// Register every subscription. Messages published after this returns are seen.
    pub fn start(self) -> SeatgateResult<RunningMediator> {
        tracing::info!("Subscribe for data points!");

        let mut mirrors = Vec::with_capacity(self.config.mirrors.len());
        for mirror in &self.config.mirrors {
            let handle = self.broker.subscribe(&SignalQuery::select(mirror.signal.clone()))?;
            let notifier = StateChangeNotifier::new(
                Arc::clone(&self.bus),
                mirror.signal.clone(),
                mirror.topic.clone(),
            );
            mirrors.push((handle, notifier));
        }

        let commands = self
            .config
            .commands
            .iter()
            .map(|route| {
                tracing::info!("Subscribe for {} -> {}", route.topic, route.target);
                (self.bus.subscribe(&route.topic), route.target.clone())
            })
            .collect();

        let correlator = ResponseCorrelator::new(Arc::clone(&self.bus), self.config.response_topic.clone());
        let mut handler = CommandHandler::new(
            Arc::clone(&self.broker),
            correlator,
            self.config.gating_signal.clone(),
        );
        if self.config.serialize_actuation {
            handler = handler.serialized();
        }

        Ok(RunningMediator {
            handler: Arc::new(handler),
            reporter: self.reporter,
            mirrors,
            commands,
        })
    }
}

/// A mediator whose subscriptions are registered and ready to dispatch.
pub struct RunningMediator {
    handler: Arc<CommandHandler>,
    reporter: Arc<ErrorReporter>,
    mirrors: Vec<(SubscriptionHandle<DataPointReply>, StateChangeNotifier)>,
    commands: Vec<(SubscriptionHandle<BusMessage>, SignalPath)>,
}

impl RunningMediator {
    /// Dispatch until every subscription has ended.
    ///
    /// Signal updates are mirrored in emission order. Each command runs as
    /// its own task, so a stalled read or write only delays its own response.
    pub async fn run(self) {
        let mut loops = JoinSet::new();

        for (handle, notifier) in self.mirrors {
            let reporter = Arc::clone(&self.reporter);
            loops.spawn(async move {
                let source = handle.source().to_string();
                dispatch(
                    handle,
                    |update| notifier.on_signal_changed(&update),
                    |status| reporter.report(ErrorContext::Datapoint, &source, status),
                )
                .await;
            });
        }

        for (handle, target) in self.commands {
            let reporter = Arc::clone(&self.reporter);
            let handler = Arc::clone(&self.handler);
            loops.spawn(async move {
                let source = handle.source().to_string();
                let mut inflight = JoinSet::new();
                dispatch(
                    handle,
                    |message: BusMessage| {
                        let handler = Arc::clone(&handler);
                        let target = target.clone();
                        inflight.spawn(async move {
                            handler.handle(&message.payload, &target).await;
                        });
                        while inflight.try_join_next().is_some() {}
                    },
                    |status| reporter.report(ErrorContext::Topic, &source, status),
                )
                .await;
                while inflight.join_next().await.is_some() {}
            });
        }

        while let Some(result) = loops.join_next().await {
            if let Err(e) = result {
                tracing::error!("Dispatch loop failed: {}", e);
            }
        }
        tracing::info!("All subscriptions ended, mediator stopped");
    }
}
