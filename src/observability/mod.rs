//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Probe results, state transitions, address mutations
//!     → logging.rs (structured log events on stdout for the supervisor)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → supervisord stdout/stderr log files
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Every transition and every real mutation is logged; no-ops only at debug
//! - Metrics are opt-in; a router host may not want another listener

pub mod logging;
pub mod metrics;
