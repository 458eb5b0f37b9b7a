//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into a ready controller
//! - Start optional background pieces (metrics endpoint, signal listener)
//! - Run the controller in the foreground and map the result to an exit code
//!
//! # Design Decisions
//! - Fail fast: anything wrong with the config is fatal before the first probe
//! - Metrics failing to bind is logged, not fatal; failover matters more

use std::net::SocketAddr;

use thiserror::Error;
use tracing::{error, warn};

use crate::address::{AddressSet, AddressSetError, IpCommand};
use crate::config::schema::DaemonConfig;
use crate::failover::{ControllerSettings, FailoverController};
use crate::health::{build_probe, HealthProbe, ProbeConfigError};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::SignalListener;
use crate::lifecycle::supervisor::ExitStatus;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("address set: {0}")]
    AddressSet(#[from] AddressSetError),

    #[error(transparent)]
    Probe(#[from] ProbeConfigError),
}

/// The controller as deployed: configured probe, iproute2 backend.
pub type DaemonController = FailoverController<Box<dyn HealthProbe>, IpCommand>;

pub fn build_controller(config: &DaemonConfig) -> Result<DaemonController, StartupError> {
    let addresses = AddressSet::from_cidrs(&config.interface, &config.addresses)?;
    let probe = build_probe(&config.probe)?;

    Ok(FailoverController::new(
        probe,
        IpCommand::default(),
        addresses,
        ControllerSettings::from_config(config),
    ))
}

/// Run the daemon in the foreground until shutdown or a fatal error.
pub async fn run_daemon(config: DaemonConfig) -> ExitStatus {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    warn!(address = %addr, error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => warn!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let controller = match build_controller(&config) {
        Ok(controller) => controller,
        Err(e) => {
            error!(error = %e, "Startup failed");
            return ExitStatus::ConfigError;
        }
    };

    let listener = match SignalListener::install() {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "Failed to install signal handlers");
            return ExitStatus::ConfigError;
        }
    };

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let signals = listener.spawn(shutdown.clone());

    let result = controller.run(receiver).await;
    signals.abort();

    if let Err(e) = &result {
        error!(error = %e, "Exiting on fatal error");
    }
    ExitStatus::from_run(&result)
}
