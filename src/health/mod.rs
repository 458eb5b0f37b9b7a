//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Polling tick
//!     → probe.rs (run_probe: hard deadline, every error folded into ProbeResult)
//!     → dns.rs | tcp.rs | http.rs | command.rs (the actual check)
//!     → state.rs (success → Healthy, anything else → Unhealthy)
//! ```
//!
//! # Design Decisions
//! - Probes never propagate errors to the caller
//! - Ambiguity is failure: stale routes are worse than a withdrawn address
//! - The mechanism is chosen by configuration; DNS is the default

pub mod command;
pub mod dns;
pub mod http;
pub mod probe;
pub mod state;
pub mod tcp;

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ProbeConfig, ProbeKind};

pub use command::CommandProbe;
pub use dns::DnsProbe;
pub use http::HttpProbe;
pub use probe::{run_probe, HealthProbe, ProbeError, ProbeResult};
pub use state::HealthState;
pub use tcp::TcpProbe;

/// A probe could not be constructed from its configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid probe configuration: {0}")]
pub struct ProbeConfigError(pub String);

/// Build the configured probe.
pub fn build_probe(config: &ProbeConfig) -> Result<Box<dyn HealthProbe>, ProbeConfigError> {
    let probe: Box<dyn HealthProbe> = match config.kind {
        ProbeKind::Dns => {
            let server: SocketAddr = config
                .server
                .parse()
                .map_err(|e| ProbeConfigError(format!("server `{}`: {}", config.server, e)))?;
            Box::new(DnsProbe::new(
                server,
                &config.query_name,
                &config.record_type,
                config.require_answer,
            )?)
        }
        ProbeKind::Tcp => {
            let target = required(&config.target, "target")?;
            Box::new(TcpProbe::new(target))
        }
        ProbeKind::Http => {
            let url = required(&config.url, "url")?;
            Box::new(HttpProbe::new(url, config.expected_status, config.timeout())?)
        }
        ProbeKind::Command => {
            let program = required(&config.program, "program")?;
            Box::new(CommandProbe::new(program, config.args.clone()))
        }
    };
    Ok(probe)
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ProbeConfigError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProbeConfigError(format!("`{}` is required", field)))
}
