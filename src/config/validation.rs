//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse every anycast CIDR and reject duplicates
//! - Check timing relations (probe timeout strictly below the interval)
//! - Check that the selected probe kind has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DaemonConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::address::AnycastAddress;
use crate::config::schema::{DaemonConfig, ProbeKind};

/// Record types the DNS probe knows how to ask for.
pub const SUPPORTED_RECORD_TYPES: &[&str] = &["A", "AAAA", "SOA", "NS", "TXT"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("interface name must not be empty")]
    EmptyInterface,

    #[error("at least one anycast address is required")]
    NoAddresses,

    #[error("invalid anycast address `{cidr}`: {reason}")]
    InvalidAddress { cidr: String, reason: String },

    #[error("duplicate anycast address `{0}`")]
    DuplicateAddress(String),

    #[error("probe.interval_secs must be greater than zero")]
    ZeroInterval,

    #[error("probe.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("probe.timeout_ms ({timeout_ms}ms) must be less than the polling interval ({interval_secs}s)")]
    TimeoutNotBelowInterval { timeout_ms: u64, interval_secs: u64 },

    #[error("probe kind `{kind}` requires `{field}`")]
    MissingProbeField { kind: &'static str, field: &'static str },

    #[error("invalid probe field `{field}`: {reason}")]
    InvalidProbeField { field: &'static str, reason: String },

    #[error("retry.max_attempts must be at least 1")]
    ZeroRetryAttempts,

    #[error("retry.base_delay_ms ({base}) must not exceed retry.max_delay_ms ({max})")]
    BackoffBounds { base: u64, max: u64 },

    #[error("invalid metrics address `{0}`")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.interface.trim().is_empty() {
        errors.push(ValidationError::EmptyInterface);
    }

    validate_addresses(config, &mut errors);
    validate_probe(config, &mut errors);

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroRetryAttempts);
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ValidationError::BackoffBounds {
            base: config.retry.base_delay_ms,
            max: config.retry.max_delay_ms,
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_addresses(config: &DaemonConfig, errors: &mut Vec<ValidationError>) {
    if config.addresses.is_empty() {
        errors.push(ValidationError::NoAddresses);
        return;
    }

    let mut seen = HashSet::new();
    for cidr in &config.addresses {
        match AnycastAddress::parse(cidr, &config.interface) {
            Ok(address) => {
                if !seen.insert(address.cidr()) {
                    errors.push(ValidationError::DuplicateAddress(address.cidr()));
                }
            }
            Err(e) => errors.push(ValidationError::InvalidAddress {
                cidr: cidr.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

fn validate_probe(config: &DaemonConfig, errors: &mut Vec<ValidationError>) {
    let probe = &config.probe;

    if probe.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if probe.interval_secs > 0 && probe.timeout() >= probe.interval() {
        errors.push(ValidationError::TimeoutNotBelowInterval {
            timeout_ms: probe.timeout_ms,
            interval_secs: probe.interval_secs,
        });
    }

    match probe.kind {
        ProbeKind::Dns => {
            if probe.server.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidProbeField {
                    field: "server",
                    reason: format!("`{}` is not an ip:port socket address", probe.server),
                });
            }
            if probe.query_name.trim().is_empty() {
                errors.push(ValidationError::MissingProbeField {
                    kind: "dns",
                    field: "query_name",
                });
            }
            let record_type = probe.record_type.to_ascii_uppercase();
            if !SUPPORTED_RECORD_TYPES.contains(&record_type.as_str()) {
                errors.push(ValidationError::InvalidProbeField {
                    field: "record_type",
                    reason: format!(
                        "`{}` is not one of {}",
                        probe.record_type,
                        SUPPORTED_RECORD_TYPES.join(", ")
                    ),
                });
            }
        }
        ProbeKind::Tcp => match probe.target.as_deref() {
            None | Some("") => errors.push(ValidationError::MissingProbeField {
                kind: "tcp",
                field: "target",
            }),
            Some(target) if !target.contains(':') => {
                errors.push(ValidationError::InvalidProbeField {
                    field: "target",
                    reason: format!("`{}` must be host:port", target),
                })
            }
            Some(_) => {}
        },
        ProbeKind::Http => match probe.url.as_deref() {
            None | Some("") => errors.push(ValidationError::MissingProbeField {
                kind: "http",
                field: "url",
            }),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                errors.push(ValidationError::InvalidProbeField {
                    field: "url",
                    reason: format!("`{}` must be an http:// or https:// URL", url),
                })
            }
            Some(_) => {}
        },
        ProbeKind::Command => {
            if probe.program.as_deref().map_or(true, |p| p.trim().is_empty()) {
                errors.push(ValidationError::MissingProbeField {
                    kind: "command",
                    field: "program",
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DaemonConfig {
        DaemonConfig {
            addresses: vec!["10.240.0.10/32".into(), "10.240.1.10/32".into()],
            ..DaemonConfig::default()
        }
    }

    #[test]
    fn test_defaults_with_addresses_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = valid();
        config.interface = String::new();
        config.addresses = vec!["10.240.0.10/33".into(), "not-an-ip".into()];
        config.retry.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyInterface));
        assert!(errors.contains(&ValidationError::ZeroRetryAttempts));
        let invalid = errors
            .iter()
            .filter(|e| matches!(e, ValidationError::InvalidAddress { .. }))
            .count();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn test_rejects_duplicates_after_normalisation() {
        let mut config = valid();
        config.addresses = vec!["2001:db8::10/128".into(), "2001:db8:0::10/128".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateAddress("2001:db8::10/128".into())]
        );
    }

    #[test]
    fn test_timeout_must_be_below_interval() {
        let mut config = valid();
        config.probe.interval_secs = 2;
        config.probe.timeout_ms = 2000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TimeoutNotBelowInterval {
                timeout_ms: 2000,
                interval_secs: 2
            }]
        );
    }

    #[test]
    fn test_empty_address_set_rejected() {
        let mut config = valid();
        config.addresses.clear();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::NoAddresses])
        );
    }

    #[test]
    fn test_probe_kind_requirements() {
        let mut config = valid();
        config.probe.kind = ProbeKind::Tcp;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MissingProbeField {
                kind: "tcp",
                field: "target"
            }])
        );

        config.probe.target = Some("127.0.0.1:53".into());
        assert_eq!(validate_config(&config), Ok(()));

        config.probe.kind = ProbeKind::Command;
        assert!(validate_config(&config).is_err());
        config.probe.program = Some("/opt/dns_ospf_check.sh".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_dns_record_type_checked() {
        let mut config = valid();
        config.probe.record_type = "aaaa".into();
        assert_eq!(validate_config(&config), Ok(()));
        config.probe.record_type = "MX".into();
        assert!(matches!(
            validate_config(&config).unwrap_err().as_slice(),
            [ValidationError::InvalidProbeField { field: "record_type", .. }]
        ));
    }
}
