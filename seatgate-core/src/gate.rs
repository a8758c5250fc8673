//! Actuation gate policy.
//!
//! Decides whether a seat movement may be issued given the freshly read
//! gating signal. The decision is pure: no I/O, no panics, for any input.

use crate::signal::SignalValue;

/// Result of the gate policy.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Allow,
    Deny(String),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Allow movement only while the vehicle is stationary.
///
/// `desired_value` is not range checked here; bounds are enforced by the
/// broker when the target signal is written.
pub fn decide(gating_value: SignalValue, _desired_value: i64) -> GateDecision {
    if gating_value.is_zero() {
        GateDecision::Allow
    } else {
        GateDecision::Deny(format!(
            "Not allowed to move seat because vehicle speed is {} and not 0",
            gating_value
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stationary_allows() {
        assert_eq!(decide(SignalValue::Int(0), 5), GateDecision::Allow);
        assert_eq!(decide(SignalValue::Float(0.0), -40), GateDecision::Allow);
    }

    #[test]
    fn moving_denies_with_speed() {
        assert_eq!(
            decide(SignalValue::Int(30), 5),
            GateDecision::Deny(
                "Not allowed to move seat because vehicle speed is 30 and not 0".to_string()
            )
        );
        assert_eq!(
            decide(SignalValue::Float(0.5), 5),
            GateDecision::Deny(
                "Not allowed to move seat because vehicle speed is 0.5 and not 0".to_string()
            )
        );
    }

    #[test]
    fn reversing_denies() {
        assert!(!decide(SignalValue::Int(-3), 100).is_allowed());
    }

    #[test]
    fn unusual_values_deny() {
        assert!(!decide(SignalValue::Float(f64::NAN), 1).is_allowed());
        assert!(!decide(SignalValue::Float(f64::INFINITY), 1).is_allowed());
        assert!(!decide(SignalValue::Bool(false), 1).is_allowed());
        assert!(decide(SignalValue::Int(0), i64::MAX).is_allowed());
    }
}
