//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the asset sender.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the asset sender.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SenderConfig {
    /// Node JSON-RPC endpoint and credentials.
    pub node: NodeConfig,

    /// Exchange policies applied to incoming wallet transactions.
    pub exchange: ExchangeConfig,

    /// Idempotency ledger settings.
    pub ledger: LedgerConfig,

    /// Read-only HTTP API settings.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// RPC host (e.g., "127.0.0.1").
    pub host: String,

    /// RPC port (8766 on mainnet).
    pub port: u16,

    /// RPC user.
    pub username: String,

    /// RPC password. Overridden by `ASSET_SENDER_RPC_PASSWORD` when set.
    pub password: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8766,
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Exchange policies. A policy left out of the file is disabled.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExchangeConfig {
    /// RVN received → asset sent back.
    pub rvn: Option<RvnPolicyConfig>,

    /// Asset received → another asset sent back.
    pub asset: Option<AssetPolicyConfig>,
}

/// RVN-for-asset policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RvnPolicyConfig {
    /// Wallet address watched for incoming RVN.
    pub listen_address: String,

    /// Asset delivered in exchange.
    pub asset_to_send: String,

    /// Assets delivered per whole RVN received.
    #[serde(default)]
    pub multiplier: Option<u64>,

    /// Confirmations required before delivering.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u32,
}

/// Asset-for-asset policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetPolicyConfig {
    /// Wallet address watched for incoming assets.
    pub listen_address: String,

    /// Asset expected in the incoming transfer, or "*" for any.
    #[serde(default = "default_expected_incoming_asset")]
    pub expected_incoming_asset: String,

    /// Asset delivered in exchange.
    pub asset_to_send: String,

    /// Assets delivered per whole asset unit received.
    #[serde(default)]
    pub multiplier: Option<u64>,

    /// Confirmations required before delivering.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u32,
}

fn default_min_confirmations() -> u32 {
    1
}

fn default_expected_incoming_asset() -> String {
    "*".to_string()
}

/// Idempotency ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON file persisting processed transaction ids. In-memory only when unset.
    pub path: Option<String>,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Bearer token for the admin endpoints.
    pub api_key: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint (API server only).
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
