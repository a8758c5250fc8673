//! Mediator and gateway configuration.

use std::net::SocketAddr;

use seatgate_core::{
    SeatgateError, SeatgateResult, SignalPath, DEFAULT_MAX_FRAME_SIZE, DRIVER_SEAT_POSITION, PASSENGER_SEAT_POSITION,
    TOPIC_CURRENT_POSITION, TOPIC_REQUEST, TOPIC_REQUEST_RIGHT, TOPIC_RESPONSE, VEHICLE_SPEED,
};

/// An inbound command topic and the signal its commands actuate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRoute {
    pub topic: String,
    pub target: SignalPath,
}

impl CommandRoute {
    pub fn new(topic: impl Into<String>, target: impl Into<SignalPath>) -> Self {
        Self {
            topic: topic.into(),
            target: target.into(),
        }
    }
}

/// A signal whose changes are mirrored onto a bus topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRoute {
    pub signal: SignalPath,
    pub topic: String,
}

impl MirrorRoute {
    pub fn new(signal: impl Into<SignalPath>, topic: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            topic: topic.into(),
        }
    }
}

/// Mediator configuration.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Signal read fresh before every actuation.
    pub gating_signal: SignalPath,
    /// Command topics and their target signals.
    pub commands: Vec<CommandRoute>,
    /// Signal-to-topic state mirrors.
    pub mirrors: Vec<MirrorRoute>,
    /// Topic receiving correlated responses.
    pub response_topic: String,
    /// Hold a per-target lock around gate check and write.
    pub serialize_actuation: bool,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            gating_signal: VEHICLE_SPEED.into(),
            commands: vec![
                CommandRoute::new(TOPIC_REQUEST, DRIVER_SEAT_POSITION),
                CommandRoute::new(TOPIC_REQUEST_RIGHT, PASSENGER_SEAT_POSITION),
            ],
            mirrors: vec![MirrorRoute::new(DRIVER_SEAT_POSITION, TOPIC_CURRENT_POSITION)],
            response_topic: TOPIC_RESPONSE.to_string(),
            serialize_actuation: false,
        }
    }
}

impl MediatorConfig {
    /// Replace the command routes.
    pub fn with_commands(mut self, commands: Vec<CommandRoute>) -> Self {
        self.commands = commands;
        self
    }

    /// Add a state mirror.
    pub fn with_mirror(mut self, mirror: MirrorRoute) -> Self {
        self.mirrors.push(mirror);
        self
    }

    pub fn with_gating_signal(mut self, signal: impl Into<SignalPath>) -> Self {
        self.gating_signal = signal.into();
        self
    }

    pub fn with_serialized_actuation(mut self, enabled: bool) -> Self {
        self.serialize_actuation = enabled;
        self
    }
}

/// TCP bus gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Max frame body size in bytes.
    pub max_frame_size: usize,
    /// Topics forwarded to every connected peer.
    pub outbound_topics: Vec<String>,
    /// Frames queued per peer before it is disconnected as too slow.
    pub outbound_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 1883)),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            outbound_topics: vec![
                TOPIC_RESPONSE.to_string(),
                TOPIC_CURRENT_POSITION.to_string(),
            ],
            outbound_capacity: 256,
        }
    }
}

impl GatewayConfig {
    /// Create a new config with custom bind address.
    pub fn with_addr(addr: impl Into<SocketAddr>) -> Self {
        Self {
            bind_addr: addr.into(),
            ..Default::default()
        }
    }

    /// Outbound topics matching a mediator configuration.
    pub fn for_mediator(mut self, config: &MediatorConfig) -> Self {
        let mut topics = vec![config.response_topic.clone()];
        topics.extend(config.mirrors.iter().map(|m| m.topic.clone()));
        topics.dedup();
        self.outbound_topics = topics;
        self
    }
}

/// Command line options of the mediator binary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediatorArgs {
    /// First non-flag argument.
    pub bind_addr: Option<SocketAddr>,
    pub serialize_actuation: bool,
}

impl MediatorArgs {
    /// Parse arguments, excluding the program name. Flags may appear anywhere.
    pub fn parse<I>(args: I) -> SeatgateResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        for arg in args {
            match arg.as_str() {
                "--serialize-actuation" => parsed.serialize_actuation = true,
                flag if flag.starts_with("--") => {
                    return Err(SeatgateError::Transport(format!("Unknown flag {}", flag)))
                }
                addr if parsed.bind_addr.is_none() => {
                    parsed.bind_addr = Some(addr.parse().map_err(|e| {
                        SeatgateError::Transport(format!("Invalid bind address {}: {}", addr, e))
                    })?);
                }
                extra => {
                    return Err(SeatgateError::Transport(format!("Unexpected argument {}", extra)))
                }
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MediatorConfig::default();
        assert_eq!(config.gating_signal.as_str(), "Vehicle.Speed");
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.commands[1].topic, "seatadjuster/setPosition/requestRight");
        assert_eq!(
            config.commands[1].target.as_str(),
            "Vehicle.Cabin.Seat.Row1.PassengerSide.Position"
        );
        assert!(!config.serialize_actuation);
    }

    #[test]
    fn custom_config() {
        let config = MediatorConfig::default()
            .with_serialized_actuation(true)
            .with_mirror(MirrorRoute::new(PASSENGER_SEAT_POSITION, "seatadjuster/currentPositionRight"));

        assert!(config.serialize_actuation);
        assert_eq!(config.mirrors.len(), 2);

        let gateway = GatewayConfig::with_addr(SocketAddr::from(([0, 0, 0, 0], 8883))).for_mediator(&config);
        assert_eq!(gateway.bind_addr.port(), 8883);
        assert_eq!(
            gateway.outbound_topics,
            vec![
                "seatadjuster/setPosition/response".to_string(),
                "seatadjuster/currentPosition".to_string(),
                "seatadjuster/currentPositionRight".to_string(),
            ]
        );
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn address_after_flag_is_used() {
        let parsed = MediatorArgs::parse(args(&["--serialize-actuation", "0.0.0.0:9000"])).unwrap();
        assert!(parsed.serialize_actuation);
        assert_eq!(parsed.bind_addr, Some(SocketAddr::from(([0, 0, 0, 0], 9000))));

        let parsed = MediatorArgs::parse(args(&["0.0.0.0:9000", "--serialize-actuation"])).unwrap();
        assert!(parsed.serialize_actuation);
        assert_eq!(parsed.bind_addr.map(|a| a.port()), Some(9000));
    }

    #[test]
    fn no_arguments_keep_defaults() {
        assert_eq!(MediatorArgs::parse(args(&[])).unwrap(), MediatorArgs::default());
    }

    #[test]
    fn bad_arguments_rejected() {
        assert!(MediatorArgs::parse(args(&["--serialise"])).is_err());
        assert!(MediatorArgs::parse(args(&["localhost"])).is_err());
        assert!(MediatorArgs::parse(args(&["127.0.0.1:1", "127.0.0.1:2"])).is_err());
    }
}
