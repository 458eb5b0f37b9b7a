//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the anycast health daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Loopback-style interface the anycast addresses are bound to.
    pub interface: String,

    /// Anycast addresses in CIDR form, in the order mutations are applied.
    pub addresses: Vec<String>,

    /// Health probe settings.
    pub probe: ProbeConfig,

    /// Per-cycle retry policy for transient address failures.
    pub retry: RetryConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Process supervisor registration.
    pub supervisor: SupervisorConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interface: "lo".to_string(),
            addresses: Vec::new(),
            probe: ProbeConfig::default(),
            retry: RetryConfig::default(),
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

/// Probe mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// UDP DNS query against the local resolver.
    Dns,
    /// TCP connect to a host:port.
    Tcp,
    /// HTTP GET expecting a success status.
    Http,
    /// External check command; exit status 0 means healthy.
    Command,
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Which mechanism to use.
    pub kind: ProbeKind,

    /// Polling interval in seconds.
    pub interval_secs: u64,

    /// Hard probe timeout in milliseconds. Must be below the interval.
    pub timeout_ms: u64,

    /// DNS server to query (`dns` kind).
    pub server: String,

    /// Name to resolve (`dns` kind).
    pub query_name: String,

    /// Record type to ask for (`dns` kind).
    pub record_type: String,

    /// Treat an empty answer section as unhealthy (`dns` kind).
    pub require_answer: bool,

    /// host:port to connect to (`tcp` kind).
    pub target: Option<String>,

    /// URL to fetch (`http` kind).
    pub url: Option<String>,

    /// Exact status to expect; any 2xx when unset (`http` kind).
    pub expected_status: Option<u16>,

    /// Program to run (`command` kind).
    pub program: Option<String>,

    /// Arguments passed to `program`.
    pub args: Vec<String>,
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: ProbeKind::Dns,
            interval_secs: 5,
            timeout_ms: 2000,
            server: "127.0.0.1:53".to_string(),
            query_name: "localhost.".to_string(),
            record_type: "A".to_string(),
            require_answer: true,
            target: None,
            url: None,
            expected_status: None,
            program: None,
            args: Vec::new(),
        }
    }
}

/// Retry configuration for transient address mutation failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per address per cycle, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time allowed to reach a consistent interface state after a signal.
    pub grace_period_secs: u64,

    /// Withdraw every managed address on clean exit.
    pub withdraw_on_exit: bool,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 5,
            withdraw_on_exit: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9187".to_string(),
        }
    }
}

/// Settings for the supervisord program stanza this daemon registers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Program name in the supervisor.
    pub program_name: String,

    /// Installed path of this binary.
    pub binary_path: String,

    pub stdout_logfile: String,

    pub stderr_logfile: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            program_name: "dns_ospf_check".to_string(),
            binary_path: "/usr/local/bin/anycast-healthd".to_string(),
            stdout_logfile: "/var/log/supervisor/dns_ospf_check.log".to_string(),
            stderr_logfile: "/var/log/supervisor/dns_ospf_check.err".to_string(),
        }
    }
}
