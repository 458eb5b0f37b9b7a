//! Controller state machine.
//!
//! # States
//! ```text
//! Unknown
//!     → Converging(target)      probe produced a target that differs from
//!                               the last converged state
//!     → Converged(target)       every address in the set matches target
//! Converging(target)
//!     → Converging(target)      transient failure, resumed next cycle
//!     → Converged(target)
//! Converged(a) → Converging(b)  next probe disagrees
//! ```
//! A pending `Converging(target)` gets one extra cycle to finish before a
//! disagreeing probe result takes over. A pending attach never outlives an
//! unhealthy result; withdrawal starts in that same cycle.

use std::fmt;

use serde::Serialize;

use crate::health::{HealthState, ProbeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Unknown,
    Converging(HealthState),
    Converged(HealthState),
}

impl ControllerState {
    /// Target still being applied, if any.
    pub fn pending(self) -> Option<HealthState> {
        match self {
            ControllerState::Converging(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Unknown => f.write_str("unknown"),
            ControllerState::Converging(target) => write!(f, "converging({})", target),
            ControllerState::Converged(state) => write!(f, "converged({})", state),
        }
    }
}

/// Everything the loop carries from one cycle to the next.
///
/// Lives from process start to exit and is owned by the controller alone.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub state: ControllerState,
    /// Health the interface last fully reflected.
    pub last_converged: HealthState,
    pub last_probe: Option<ProbeResult>,
    /// The pending target already took its extra cycle.
    pub resumed_pending: bool,
    pub cycles: u64,
    pub transitions: u64,
}

impl LoopState {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Unknown,
            last_converged: HealthState::Unknown,
            last_probe: None,
            resumed_pending: false,
            cycles: 0,
            transitions: 0,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state.to_string(),
            health: self.last_converged,
            cycles: self.cycles,
            transitions: self.transitions,
            last_probe: self.last_probe.clone(),
        }
    }
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable view of the controller for logs and tooling.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: String,
    pub health: HealthState,
    pub cycles: u64,
    pub transitions: u64,
    pub last_probe: Option<ProbeResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ControllerState::Unknown.to_string(), "unknown");
        assert_eq!(
            ControllerState::Converging(HealthState::Healthy).to_string(),
            "converging(healthy)"
        );
        assert_eq!(
            ControllerState::Converged(HealthState::Unhealthy).to_string(),
            "converged(unhealthy)"
        );
    }

    #[test]
    fn test_pending_target() {
        let pending = ControllerState::Converging(HealthState::Healthy);
        assert_eq!(pending.pending(), Some(HealthState::Healthy));
        assert_eq!(ControllerState::Converged(HealthState::Healthy).pending(), None);
        assert_eq!(ControllerState::Unknown.pending(), None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = LoopState::new().snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "unknown");
        assert_eq!(json["health"], "unknown");
        assert!(json["last_probe"].is_null());
    }
}
