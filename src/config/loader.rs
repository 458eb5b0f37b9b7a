//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::DaemonConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Comma-separated CIDR list replacing `addresses`.
pub const ENV_ADDRESSES: &str = "ANYCAST_ADDRESSES";
/// Interface name replacing `interface`.
pub const ENV_INTERFACE: &str = "ANYCAST_INTERFACE";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides, and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse configuration text with an injectable environment lookup.
pub fn parse_config<F>(content: &str, env: F) -> Result<DaemonConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: DaemonConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut DaemonConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = env(ENV_ADDRESSES) {
        config.addresses = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(interface) = env(ENV_INTERFACE) {
        config.interface = interface.trim().to_string();
    }
}
