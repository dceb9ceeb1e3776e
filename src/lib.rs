//! Ravencoin incoming-transaction asset exchange.
//!
//! Given a transaction the node's wallet has seen, classify it, trace its
//! sender one hop back through the UTXO graph and, when an exchange policy
//! accepts it, answer with an asset transfer to that sender at most once.

pub mod api;
pub mod chain;
pub mod config;
pub mod exchange;
pub mod lifecycle;
pub mod observability;
pub mod rpc;

pub use config::SenderConfig;
pub use exchange::{ExchangeEngine, IncomingHandler};
pub use lifecycle::Shutdown;
