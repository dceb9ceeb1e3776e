//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::SenderConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `node.password`.
pub const RPC_PASSWORD_ENV_VAR: &str = "ASSET_SENDER_RPC_PASSWORD";

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

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SenderConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config = parse_config(&content)?;

    if let Ok(password) = std::env::var(RPC_PASSWORD_ENV_VAR) {
        config.node.password = password;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration text without touching the environment or validating.
pub fn parse_config(content: &str) -> Result<SenderConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}
