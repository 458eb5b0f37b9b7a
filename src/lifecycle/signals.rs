//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGTERM (supervisor stop) and SIGINT (operator Ctrl+C)
//! - Translate the first one into a [`Shutdown`] trigger
//!
//! # Design Decisions
//! - Handlers are registered synchronously, before any address is touched, so
//!   a SIGTERM can never take the default action and leave addresses bound
//! - A handler that cannot be registered aborts startup instead

use std::io;

use tokio::task::JoinHandle;
use tracing::info;

use crate::lifecycle::shutdown::Shutdown;

/// Registered SIGINT/SIGTERM handlers.
#[cfg(unix)]
pub struct SignalListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    /// Register both handlers now. From here on neither signal kills the process.
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the first shutdown signal and report its name.
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
pub struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    pub fn install() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "ctrl-c"
    }
}

impl SignalListener {
    /// Trigger `shutdown` on the first signal.
    pub fn spawn(mut self, shutdown: Shutdown) -> JoinHandle<()> {
        tokio::spawn(async move {
            let name = self.recv().await;
            info!(signal = name, "Received signal, starting graceful shutdown");
            shutdown.trigger();
        })
    }
}
