//! Failover subsystem.
//!
//! # Data Flow
//! ```text
//! Interval tick (or shutdown)
//!     → health::run_probe (bounded, cancellable on shutdown)
//!     → target = Healthy | Unhealthy, or the pending target if one exists
//!     → controller.rs converge: attach or detach each address in set order
//!         - transient: retry with backoff, then defer to the next cycle
//!         - permission / invalid address: stop, surface a fatal error
//!     → state.rs (Converging → Converged, transition logged)
//!
//! Shutdown:
//!     → withdraw (or restore last converged state) within the grace period
//!     → Clean / Unconfirmed outcome for the exit code
//! ```
//!
//! # Design Decisions
//! - A single sequential loop owns all mutations; no locking needed
//! - Probe waits are cancellable, mutations are not (they are bounded)
//! - The interface binding is re-checked every cycle so drift is repaired

pub mod controller;
pub mod state;

use thiserror::Error;

use crate::address::AddressError;
use crate::health::HealthState;

pub use controller::{ControllerSettings, FailoverController, ShutdownOutcome};
pub use state::{ControllerState, LoopState, StatusSnapshot};

/// Result of one polling cycle that did not hit a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Reached a new health state.
    Converged(HealthState),
    /// Already in this state; any drift was repaired.
    Unchanged(HealthState),
    /// Some addresses still failed transiently; finished next cycle.
    Deferred(HealthState),
}

impl CycleOutcome {
    pub fn target(self) -> HealthState {
        match self {
            CycleOutcome::Converged(t) | CycleOutcome::Unchanged(t) | CycleOutcome::Deferred(t) => t,
        }
    }
}

#[derive(Debug, Error)]
pub enum FailoverError {
    /// Non-retryable misconfiguration; the process must exit.
    #[error("fatal address failure for {address} on {interface}: {source}")]
    Fatal {
        address: String,
        interface: String,
        source: AddressError,
    },
}
