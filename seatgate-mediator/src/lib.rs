//! # seatgate-mediator
//!
//! Bridges a vehicle signal broker and a message bus. Set-position commands
//! arriving on the bus are validated, gated on a freshly read vehicle speed,
//! actuated on the broker and answered with a response correlated to the
//! request id. Independently, seat position changes are mirrored onto the bus.
//!
//! ```text
//! bus request ──> CommandHandler ──> gate ──> Actuator ──> ResponseCorrelator ──> bus response
//! broker update ──> StateChangeNotifier ──> bus state mirror
//! ```

pub mod actuator;
pub mod broker;
pub mod bus;
pub mod config;
pub mod correlator;
pub mod gateway;
pub mod handler;
pub mod mediator;
pub mod notifier;
pub mod reporter;
pub mod subscription;

pub use actuator::Actuator;
pub use broker::{InMemoryBroker, VehicleBroker};
pub use bus::{BusMessage, LocalBus, MessageBus};
pub use config::{CommandRoute, GatewayConfig, MediatorArgs, MediatorConfig, MirrorRoute};
pub use correlator::ResponseCorrelator;
pub use gateway::Gateway;
pub use handler::CommandHandler;
pub use mediator::{Mediator, RunningMediator};
pub use notifier::StateChangeNotifier;
pub use reporter::{ErrorContext, ErrorReporter};
pub use subscription::{dispatch, SubscriptionHandle};
