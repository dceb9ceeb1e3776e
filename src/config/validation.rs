//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but cannot work:
//! empty credentials, zero timeouts, unusable addresses and asset names.
//! Every problem is reported, not just the first.

use std::net::SocketAddr;

use crate::config::schema::{AssetPolicyConfig, RvnPolicyConfig, SenderConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SenderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.node.host.trim().is_empty() {
        errors.push(ValidationError::new("node.host", "must not be empty"));
    }
    if config.node.port == 0 {
        errors.push(ValidationError::new("node.port", "must be greater than 0"));
    }
    if config.node.username.is_empty() {
        errors.push(ValidationError::new("node.username", "must not be empty"));
    }
    if config.node.timeout_secs == 0 {
        errors.push(ValidationError::new("node.timeout_secs", "must be greater than 0"));
    }

    if let Some(rvn) = &config.exchange.rvn {
        validate_rvn_policy(rvn, &mut errors);
    }
    if let Some(asset) = &config.exchange.asset {
        validate_asset_policy(asset, &mut errors);
    }

    if config.api.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "api.bind_address",
            format!("'{}' is not a socket address", config.api.bind_address),
        ));
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rvn_policy(policy: &RvnPolicyConfig, errors: &mut Vec<ValidationError>) {
    if policy.listen_address.trim().is_empty() {
        errors.push(ValidationError::new("exchange.rvn.listen_address", "must not be empty"));
    }
    if !is_asset_name(&policy.asset_to_send) {
        errors.push(ValidationError::new(
            "exchange.rvn.asset_to_send",
            format!("'{}' is not an asset name", policy.asset_to_send),
        ));
    }
    if policy.multiplier == Some(0) {
        errors.push(ValidationError::new("exchange.rvn.multiplier", "must be at least 1"));
    }
}

fn validate_asset_policy(policy: &AssetPolicyConfig, errors: &mut Vec<ValidationError>) {
    if policy.listen_address.trim().is_empty() {
        errors.push(ValidationError::new("exchange.asset.listen_address", "must not be empty"));
    }
    if policy.expected_incoming_asset != "*" && !is_asset_name(&policy.expected_incoming_asset) {
        errors.push(ValidationError::new(
            "exchange.asset.expected_incoming_asset",
            format!("'{}' is neither \"*\" nor an asset name", policy.expected_incoming_asset),
        ));
    }
    if !is_asset_name(&policy.asset_to_send) {
        errors.push(ValidationError::new(
            "exchange.asset.asset_to_send",
            format!("'{}' is not an asset name", policy.asset_to_send),
        ));
    }
    if policy.multiplier == Some(0) {
        errors.push(ValidationError::new("exchange.asset.multiplier", "must be at least 1"));
    }
}

/// Loose asset-name check: non-empty, no whitespace, no wildcard.
fn is_asset_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('*') && !name.chars().any(char::is_whitespace)
}
