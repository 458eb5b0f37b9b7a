//! Health-check driven anycast address controller.
//!
//! Probes the local service and attaches or detaches the configured anycast
//! addresses on a loopback-style interface. The routing daemon redistributes
//! whatever is bound there, so address presence is what steers traffic.

pub mod address;
pub mod config;
pub mod failover;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use address::{AddressManager, AddressSet, AnycastAddress};
pub use config::schema::DaemonConfig;
pub use failover::FailoverController;
pub use health::{HealthProbe, HealthState, ProbeResult};
pub use lifecycle::{ExitStatus, Shutdown};
