//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Address mutation fails with AddressError::Transient
//!     → retries.rs (attempt left? sleep backoff + jitter, try again)
//!     → attempts exhausted: defer to the next polling cycle
//! ```
//!
//! # Design Decisions
//! - Retries are bounded inside one cycle so cycles never overlap
//! - Fatal errors are never retried
//! - Jittered backoff keeps a fleet of hosts from retrying in lockstep

pub mod retries;

pub use retries::{calculate_backoff, RetryPolicy};
