//! Typed node methods over the RPC gateway.
//!
//! # Responsibilities
//! - Build named parameters for each node method
//! - Decode each response into a value object
//! - Map the node's "no such transaction" error to `ChainError::NotFound`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::chain::types::{
    AddressValidation, AssetData, BlockchainInfo, ChainError, ChainResult, RawTransaction,
    TxOut, WalletTransaction,
};
use crate::rpc::{RpcError, RpcGateway};

/// Read and transfer operations the exchange core and the API consume.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// In-wallet view of a transaction (`gettransaction`).
    async fn get_wallet_transaction(&self, txid: &str) -> ChainResult<WalletTransaction>;

    /// Hex-encoded transaction (`getrawtransaction`, non-verbose).
    async fn get_raw_transaction(&self, txid: &str) -> ChainResult<String>;

    /// Structured form of a hex-encoded transaction (`decoderawtransaction`).
    async fn decode_raw_transaction(&self, hex: &str) -> ChainResult<RawTransaction>;

    /// Unspent output `n` of `txid` (`gettxout`).
    async fn get_tx_out(&self, txid: &str, n: u32) -> ChainResult<TxOut>;

    /// Wallet balance of one asset (`listmyassets`). Unknown assets have balance 0.
    async fn list_my_asset_balance(&self, asset: &str) -> ChainResult<f64>;

    /// Node-side address check (`validateaddress`).
    async fn validate_address(&self, address: &str) -> ChainResult<AddressValidation>;

    /// Send `qty` units of `asset` to `to_address` (`transfer`). Returns the txids.
    async fn transfer_asset(&self, asset: &str, qty: u64, to_address: &str)
        -> ChainResult<Vec<String>>;

    /// Asset metadata (`getassetdata`).
    async fn get_asset_data(&self, asset: &str) -> ChainResult<AssetData>;

    /// Chain summary (`getblockchaininfo`).
    async fn get_blockchain_info(&self) -> ChainResult<BlockchainInfo>;

    /// Height of the best chain (`getblockcount`).
    async fn get_block_count(&self) -> ChainResult<u64>;

    /// Any transaction, in or out of the wallet, in decoded form.
    async fn get_public_transaction(&self, txid: &str) -> ChainResult<RawTransaction> {
        let hex = self.get_raw_transaction(txid).await?;
        self.decode_raw_transaction(&hex).await
    }

    /// Confirmations of output `n` of `txid`.
    async fn get_transaction_confirmations(&self, txid: &str, n: u32) -> ChainResult<i64> {
        Ok(self.get_tx_out(txid, n).await?.confirmations)
    }
}

/// Chain reader backed by a live node.
#[derive(Debug, Clone)]
pub struct NodeChainReader<G> {
    gateway: G,
}

impl<G: RpcGateway> NodeChainReader<G> {
    /// Wrap an RPC gateway.
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Invoke `method` and decode a non-null result into `T`.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
        subject: &str,
    ) -> ChainResult<T> {
        let value = self.invoke(method, params, subject).await?;
        if value.is_null() {
            return Err(ChainError::NotFound(format!("{} {}", method, subject)));
        }
        decode(method, value)
    }

    async fn invoke(&self, method: &'static str, params: Value, subject: &str) -> ChainResult<Value> {
        self.gateway.invoke(method, params).await.map_err(|e| {
            if e.is_not_found() {
                ChainError::NotFound(format!("{} {}: {}", method, subject, e))
            } else {
                ChainError::Rpc(e)
            }
        })
    }
}

fn decode<T: DeserializeOwned>(method: &'static str, value: Value) -> ChainResult<T> {
    serde_json::from_value(value).map_err(|e| ChainError::Decode {
        method,
        message: e.to_string(),
    })
}

#[async_trait]
impl<G: RpcGateway> ChainReader for NodeChainReader<G> {
    async fn get_wallet_transaction(&self, txid: &str) -> ChainResult<WalletTransaction> {
        self.call("gettransaction", json!({ "txid": txid }), txid).await
    }

    async fn get_raw_transaction(&self, txid: &str) -> ChainResult<String> {
        self.call("getrawtransaction", json!({ "txid": txid, "verbose": false }), txid)
            .await
    }

    async fn decode_raw_transaction(&self, hex: &str) -> ChainResult<RawTransaction> {
        self.call("decoderawtransaction", json!({ "hexstring": hex }), "hexstring")
            .await
    }

    async fn get_tx_out(&self, txid: &str, n: u32) -> ChainResult<TxOut> {
        let subject = format!("{}:{}", txid, n);
        self.call(
            "gettxout",
            json!({ "txid": txid, "n": n, "include_mempool": true }),
            &subject,
        )
        .await
    }

    async fn list_my_asset_balance(&self, asset: &str) -> ChainResult<f64> {
        let value = self
            .invoke("listmyassets", json!({ "asset": asset, "verbose": false }), asset)
            .await?;
        if value.is_null() {
            return Ok(0.0);
        }
        let balances: HashMap<String, f64> = decode("listmyassets", value)?;
        Ok(balances.get(asset).copied().unwrap_or(0.0))
    }

    async fn validate_address(&self, address: &str) -> ChainResult<AddressValidation> {
        self.call("validateaddress", json!({ "address": address }), address)
            .await
    }

    async fn transfer_asset(
        &self,
        asset: &str,
        qty: u64,
        to_address: &str,
    ) -> ChainResult<Vec<String>> {
        let value = self
            .invoke(
                "transfer",
                json!({ "asset_name": asset, "qty": qty, "to_address": to_address }),
                asset,
            )
            .await?;
        // Older nodes return a bare txid string instead of an array.
        match value {
            Value::String(txid) => Ok(vec![txid]),
            other => decode("transfer", other),
        }
    }

    async fn get_asset_data(&self, asset: &str) -> ChainResult<AssetData> {
        self.call("getassetdata", json!({ "asset_name": asset }), asset)
            .await
    }

    async fn get_blockchain_info(&self) -> ChainResult<BlockchainInfo> {
        self.call("getblockchaininfo", json!({}), "chain").await
    }

    async fn get_block_count(&self) -> ChainResult<u64> {
        self.call("getblockcount", json!({}), "chain").await
    }
}
