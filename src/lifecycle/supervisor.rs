//! Contract with the external always-restart supervisor.
//!
//! # Exit Codes
//! - `0`: clean, externally requested shutdown
//! - `1`: startup failed (configuration, signal handlers)
//! - `2`: non-retryable address failure (permission, invalid address)
//! - `3`: shutdown without confirmed convergence
//!
//! Any non-zero code lets the supervisor apply its restart/backoff policy.

use std::path::Path;
use std::process::ExitCode;

use crate::config::schema::SupervisorConfig;
use crate::failover::{FailoverError, ShutdownOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Clean = 0,
    ConfigError = 1,
    FatalAddress = 2,
    Unconfirmed = 3,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_run(result: &Result<ShutdownOutcome, FailoverError>) -> Self {
        match result {
            Ok(ShutdownOutcome::Clean) => ExitStatus::Clean,
            Ok(ShutdownOutcome::Unconfirmed) => ExitStatus::Unconfirmed,
            Err(FailoverError::Fatal { .. }) => ExitStatus::FatalAddress,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Render the supervisord `[program:x]` stanza that runs this daemon.
///
/// `stopwaitsecs` leaves room past the grace period so the supervisor does
/// not SIGKILL a process that is still withdrawing addresses.
pub fn render_program(config: &SupervisorConfig, config_path: &Path, grace_period_secs: u64) -> String {
    format!(
        "[program:{name}]\n\
         command={binary} --config {config} run\n\
         autostart=true\n\
         autorestart=true\n\
         startsecs=5\n\
         startretries=10\n\
         stopsignal=TERM\n\
         stopwaitsecs={stop_wait}\n\
         stdout_logfile={stdout}\n\
         stderr_logfile={stderr}\n",
        name = config.program_name,
        binary = config.binary_path,
        config = config_path.display(),
        stop_wait = grace_period_secs + 5,
        stdout = config.stdout_logfile,
        stderr = config.stderr_logfile,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::from_run(&Ok(ShutdownOutcome::Clean)).code(), 0);
        assert_eq!(ExitStatus::from_run(&Ok(ShutdownOutcome::Unconfirmed)).code(), 3);

        let fatal = Err(FailoverError::Fatal {
            address: "10.240.0.10/32".into(),
            interface: "lo".into(),
            source: AddressError::PermissionDenied("Operation not permitted".into()),
        });
        assert_eq!(ExitStatus::from_run(&fatal), ExitStatus::FatalAddress);
    }

    #[test]
    fn test_render_program() {
        let stanza = render_program(
            &SupervisorConfig::default(),
            Path::new("/etc/anycast-healthd/config.toml"),
            5,
        );

        assert!(stanza.starts_with("[program:dns_ospf_check]\n"));
        assert!(stanza.contains(
            "\ncommand=/usr/local/bin/anycast-healthd --config /etc/anycast-healthd/config.toml run\n"
        ));
        assert!(stanza.contains("\nautorestart=true\n"));
        assert!(stanza.contains("\nstopsignal=TERM\n"));
        assert!(stanza.contains("\nstopwaitsecs=10\n"));
    }
}
