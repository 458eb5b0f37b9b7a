//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read, deserialize, apply ANYCAST_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → DaemonConfig (validated, immutable for the life of the process)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the supervisor restart is the reload path
//! - All fields have defaults so a minimal file only lists the addresses
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DaemonConfig, ObservabilityConfig, ProbeConfig, ProbeKind, RetryConfig, ShutdownConfig,
    SupervisorConfig,
};
pub use validation::{validate_config, ValidationError};
