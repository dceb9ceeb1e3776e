//! Value objects decoded from node responses, and chain error definitions.
//!
//! Every RPC response is deserialized once into one of these types. Fields the
//! engine relies on are required, so a malformed response fails at decode time
//! instead of at first field access.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::rpc::RpcError;

/// Errors that can occur while reading chain or wallet state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChainError {
    /// The referenced transaction, output or asset is unknown to the node.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The node could not be reached or rejected the call.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The node answered with a shape we do not understand.
    #[error("Unexpected {method} response: {message}")]
    Decode { method: &'static str, message: String },
}

/// Result type for chain reader operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Direction of a wallet transaction entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Send,
    Receive,
    /// generate, immature, orphan and anything newer.
    #[serde(other)]
    Other,
}

/// In-wallet transaction as reported by `gettransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub txid: String,
    /// Net RVN amount for the wallet.
    pub amount: f64,
    /// Negative when the transaction conflicts with the best chain.
    pub confirmations: i64,
    /// Only present on transactions the wallet paid for.
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
    #[serde(default)]
    pub asset_details: Vec<AssetDetail>,
}

/// One RVN movement inside a wallet transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub category: Category,
    #[serde(default)]
    pub address: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub vout: u32,
}

/// One asset movement inside a wallet transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetail {
    pub category: Category,
    #[serde(alias = "address")]
    pub destination: String,
    pub amount: f64,
    pub asset_name: String,
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub vout: u32,
}

/// Decoded transaction as reported by `decoderawtransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<TxInput>,
    #[serde(default)]
    pub vout: Vec<TxOutput>,
}

impl RawTransaction {
    /// Output with index `n`.
    ///
    /// Matches on the `n` field; positional lookup is only used when the node
    /// omitted `n` on every output.
    pub fn output(&self, n: u32) -> Option<&TxOutput> {
        if self.vout.iter().any(|o| o.n.is_some()) {
            self.vout.iter().find(|o| o.n == Some(n))
        } else {
            self.vout.get(n as usize)
        }
    }
}

/// Transaction input. Coinbase inputs carry no previous outpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub vout: Option<u32>,
    #[serde(default)]
    pub coinbase: Option<String>,
}

/// Transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub n: Option<u32>,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

/// Locking script summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default, rename = "type")]
    pub script_type: Option<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub asset: Option<ScriptAsset>,
}

/// Asset payload of an asset transfer output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptAsset {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Unspent output as reported by `gettxout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOut {
    pub bestblock: String,
    pub confirmations: i64,
    pub value: f64,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
    #[serde(default)]
    pub coinbase: bool,
}

/// Result of `validateaddress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressValidation {
    pub isvalid: bool,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub ismine: Option<bool>,
}

/// Asset metadata as reported by `getassetdata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetData {
    pub name: String,
    pub amount: f64,
    pub units: u8,
    #[serde(deserialize_with = "flag")]
    pub reissuable: bool,
    #[serde(deserialize_with = "flag")]
    pub has_ipfs: bool,
    #[serde(default)]
    pub ipfs_hash: Option<String>,
}

/// Chain summary as reported by `getblockchaininfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    pub bestblockhash: String,
    pub difficulty: f64,
    #[serde(default)]
    pub pruned: bool,
}

/// Older nodes report boolean flags as 0/1.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
