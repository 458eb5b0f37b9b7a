//! Local service health state.
//!
//! # States
//! - Unknown: before the first probe completes
//! - Healthy: addresses should be announced
//! - Unhealthy: addresses should be withdrawn
//!
//! # State Transitions
//! ```text
//! Unknown → Healthy | Unhealthy    (first probe)
//! Healthy ↔ Unhealthy              (later probes)
//! ```
//! Nothing ever returns to Unknown.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthState {
    /// Anything short of a definitive success is unhealthy.
    pub fn from_probe(success: bool) -> Self {
        if success {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }

    /// Whether moving from `self` to `next` is a legal change of state.
    pub fn can_transition_to(self, next: HealthState) -> bool {
        match (self, next) {
            (_, HealthState::Unknown) => false,
            (HealthState::Unknown, _) => true,
            (current, next) => current != next,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use HealthState::*;

        assert!(Unknown.can_transition_to(Healthy));
        assert!(Unknown.can_transition_to(Unhealthy));
        assert!(Healthy.can_transition_to(Unhealthy));
        assert!(Unhealthy.can_transition_to(Healthy));

        assert!(!Healthy.can_transition_to(Healthy));
        assert!(!Healthy.can_transition_to(Unknown));
        assert!(!Unhealthy.can_transition_to(Unknown));
        assert!(!Unknown.can_transition_to(Unknown));
    }

    #[test]
    fn test_from_probe() {
        assert_eq!(HealthState::from_probe(true), HealthState::Healthy);
        assert_eq!(HealthState::from_probe(false), HealthState::Unhealthy);
    }
}
