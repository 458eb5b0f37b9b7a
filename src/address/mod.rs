//! Anycast address subsystem.
//!
//! # Data Flow
//! ```text
//! Configured CIDR list
//!     → set.rs (parse, dedupe, keep order → AddressSet)
//!
//! attach/detach request
//!     → manager.rs (read live bindings, skip no-ops, log real mutations)
//!     → backend.rs (InterfaceBackend trait: list / add / del)
//!     → iproute.rs (iproute2 against the kernel)
//! ```
//!
//! # Design Decisions
//! - Every mutation is preceded by a fresh read; nothing is cached
//! - Only addresses handed to the manager are ever touched
//! - Backend failures are classified once, at the kernel boundary

pub mod backend;
pub mod iproute;
pub mod manager;
pub mod set;

pub use backend::{AddressError, InterfaceBackend};
pub use iproute::IpCommand;
pub use manager::{AddressManager, BindingReport, Change};
pub use set::{AddressSet, AddressSetError, AnycastAddress, CidrError};
