//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, apply ASSET_SENDER_RPC_PASSWORD)
//!     → validation.rs (semantic checks)
//!     → SenderConfig (validated, immutable)
//!     → node settings to the RPC client, policies to the exchange handler
//! ```
//!
//! # Design Decisions
//! - Config is read once per process; the hook binary is short-lived
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, AssetPolicyConfig, ExchangeConfig, LedgerConfig, NodeConfig,
    ObservabilityConfig, RvnPolicyConfig, SenderConfig,
};
