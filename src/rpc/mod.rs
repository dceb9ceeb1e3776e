//! Node RPC gateway.
//!
//! # Data Flow
//! ```text
//! NodeConfig (host, port, credentials, timeout)
//!     → client.rs (HTTP POST, Basic auth, timeout)
//!     → types.rs (JSON-RPC envelope → Value or RpcError)
//!     → chain reader
//! ```
//!
//! # Security Constraints
//! - Credentials only come from config or ASSET_SENDER_RPC_PASSWORD
//! - Never log the RPC password

pub mod client;
pub mod types;

pub use client::{RpcClient, RpcGateway};
pub use types::{RpcError, RpcResult};
