//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build probe + address set → Run controller
//!
//! Signals (signals.rs):
//!     handlers registered before the first probe
//!     SIGTERM/SIGINT → Shutdown trigger (shutdown.rs)
//!
//! Shutdown:
//!     Controller stops polling → final convergence within grace → exit code
//!     (supervisor.rs)
//! ```
//!
//! # Design Decisions
//! - Runs in the foreground; the supervisor owns daemonization and restarts
//! - Exit codes are the only channel back to the supervisor
//! - Shutdown has a deadline: unconfirmed convergence exits non-zero

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use signals::SignalListener;
pub use startup::{build_controller, run_daemon, DaemonController, StartupError};
pub use supervisor::{render_program, ExitStatus};
