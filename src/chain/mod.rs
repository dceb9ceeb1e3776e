//! Typed access to chain and wallet state.
//!
//! # Data Flow
//! ```text
//! RpcGateway (raw JSON-RPC)
//!     → reader.rs (named params, null → NotFound)
//!     → types.rs (static value objects)
//!     → exchange engine, HTTP API
//! ```
//!
//! # Design Decisions
//! - Each response is decoded once into a serde struct
//! - Node error -5 and null results surface as `ChainError::NotFound`

pub mod reader;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use reader::{ChainReader, NodeChainReader};
pub use types::{
    AddressValidation, AssetData, AssetDetail, BlockchainInfo, Category, ChainError, ChainResult,
    RawTransaction, ScriptPubKey, TransactionDetail, TxInput, TxOut, TxOutput, WalletTransaction,
};
