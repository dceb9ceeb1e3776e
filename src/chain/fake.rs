//! In-memory chain reader for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::chain::reader::ChainReader;
use crate::chain::types::*;
use crate::rpc::RpcError;

const HEX_PREFIX: &str = "hex:";

#[derive(Default)]
pub struct FakeChainReader {
    wallet: HashMap<String, WalletTransaction>,
    raw: HashMap<String, RawTransaction>,
    balances: HashMap<String, f64>,
    assets: HashMap<String, AssetData>,
    valid_addresses: HashSet<String>,
    fail_transfer: bool,
    calls: Mutex<Vec<String>>,
    transfers: Mutex<Vec<(String, u64, String)>>,
}

impl FakeChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet_tx(mut self, tx: WalletTransaction) -> Self {
        self.wallet.insert(tx.txid.clone(), tx);
        self
    }

    pub fn with_raw_tx(mut self, tx: RawTransaction) -> Self {
        self.raw.insert(tx.txid.clone(), tx);
        self
    }

    pub fn with_balance(mut self, asset: &str, balance: f64) -> Self {
        self.balances.insert(asset.to_string(), balance);
        self
    }

    pub fn with_asset_data(mut self, data: AssetData) -> Self {
        self.assets.insert(data.name.clone(), data);
        self
    }

    pub fn with_valid_address(mut self, address: &str) -> Self {
        self.valid_addresses.insert(address.to_string());
        self
    }

    pub fn failing_transfers(mut self) -> Self {
        self.fail_transfer = true;
        self
    }

    /// Method names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls().iter().any(|c| c == method)
    }

    /// `(asset, qty, to_address)` of every transfer attempted.
    pub fn transfers(&self) -> Vec<(String, u64, String)> {
        self.transfers.lock().unwrap().clone()
    }

    fn record(&self, method: &str) {
        self.calls.lock().unwrap().push(method.to_string());
    }
}

#[async_trait]
impl ChainReader for FakeChainReader {
    async fn get_wallet_transaction(&self, txid: &str) -> ChainResult<WalletTransaction> {
        self.record("gettransaction");
        self.wallet
            .get(txid)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("gettransaction {}", txid)))
    }

    async fn get_raw_transaction(&self, txid: &str) -> ChainResult<String> {
        self.record("getrawtransaction");
        if self.raw.contains_key(txid) {
            Ok(format!("{}{}", HEX_PREFIX, txid))
        } else {
            Err(ChainError::NotFound(format!("getrawtransaction {}", txid)))
        }
    }

    async fn decode_raw_transaction(&self, hex: &str) -> ChainResult<RawTransaction> {
        self.record("decoderawtransaction");
        hex.strip_prefix(HEX_PREFIX)
            .and_then(|txid| self.raw.get(txid))
            .cloned()
            .ok_or_else(|| ChainError::Rpc(RpcError::Node {
                code: -22,
                message: "TX decode failed".into(),
            }))
    }

    async fn get_tx_out(&self, txid: &str, n: u32) -> ChainResult<TxOut> {
        self.record("gettxout");
        let output = self
            .raw
            .get(txid)
            .and_then(|tx| tx.output(n))
            .ok_or_else(|| ChainError::NotFound(format!("gettxout {}:{}", txid, n)))?;
        let confirmations = self.wallet.get(txid).map(|tx| tx.confirmations).unwrap_or(1);
        Ok(TxOut {
            bestblock: "00".repeat(32),
            confirmations,
            value: output.value,
            script_pub_key: output.script_pub_key.clone(),
            coinbase: false,
        })
    }

    async fn list_my_asset_balance(&self, asset: &str) -> ChainResult<f64> {
        self.record("listmyassets");
        Ok(self.balances.get(asset).copied().unwrap_or(0.0))
    }

    async fn validate_address(&self, address: &str) -> ChainResult<AddressValidation> {
        self.record("validateaddress");
        let isvalid = self.valid_addresses.contains(address);
        Ok(AddressValidation {
            isvalid,
            address: isvalid.then(|| address.to_string()),
            ismine: Some(false),
        })
    }

    async fn transfer_asset(
        &self,
        asset: &str,
        qty: u64,
        to_address: &str,
    ) -> ChainResult<Vec<String>> {
        self.record("transfer");
        let mut transfers = self.transfers.lock().unwrap();
        transfers.push((asset.to_string(), qty, to_address.to_string()));
        if self.fail_transfer {
            return Err(ChainError::Rpc(RpcError::Node {
                code: -6,
                message: "Insufficient funds".into(),
            }));
        }
        Ok(vec![format!("dispatch-{}", transfers.len())])
    }

    async fn get_asset_data(&self, asset: &str) -> ChainResult<AssetData> {
        self.record("getassetdata");
        self.assets
            .get(asset)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("getassetdata {}", asset)))
    }

    async fn get_blockchain_info(&self) -> ChainResult<BlockchainInfo> {
        self.record("getblockchaininfo");
        Ok(BlockchainInfo {
            chain: "main".into(),
            blocks: 1000,
            headers: 1000,
            bestblockhash: "00".repeat(32),
            difficulty: 1.0,
            pruned: false,
        })
    }

    async fn get_block_count(&self) -> ChainResult<u64> {
        self.record("getblockcount");
        Ok(1000)
    }
}

/// Wallet view of an RVN payment to `address`.
pub fn rvn_receive(txid: &str, address: &str, amount: f64, confirmations: i64) -> WalletTransaction {
    WalletTransaction {
        txid: txid.to_string(),
        amount,
        confirmations,
        fee: None,
        details: vec![TransactionDetail {
            category: Category::Receive,
            address: Some(address.to_string()),
            amount,
            vout: 0,
        }],
        asset_details: Vec::new(),
    }
}

/// Wallet view of an asset transfer to `address`.
pub fn asset_receive(
    txid: &str,
    address: &str,
    asset: &str,
    amount: f64,
    confirmations: i64,
) -> WalletTransaction {
    WalletTransaction {
        txid: txid.to_string(),
        amount: 0.0,
        confirmations,
        fee: None,
        details: Vec::new(),
        asset_details: vec![AssetDetail {
            category: Category::Receive,
            destination: address.to_string(),
            amount,
            asset_name: asset.to_string(),
            asset_type: Some("transfer_asset".into()),
            vout: 0,
        }],
    }
}

/// Decoded transaction spending `input` with one output per address list.
pub fn raw_tx(txid: &str, input: Option<(&str, u32)>, outputs: &[&[&str]]) -> RawTransaction {
    RawTransaction {
        txid: txid.to_string(),
        vin: input
            .map(|(prev, vout)| TxInput {
                txid: Some(prev.to_string()),
                vout: Some(vout),
                coinbase: None,
            })
            .into_iter()
            .collect(),
        vout: outputs
            .iter()
            .enumerate()
            .map(|(n, addresses)| TxOutput {
                value: 1.0,
                n: Some(n as u32),
                script_pub_key: ScriptPubKey {
                    script_type: Some("pubkeyhash".into()),
                    addresses: addresses.iter().map(|a| a.to_string()).collect(),
                    asset: None,
                },
            })
            .collect(),
    }
}

/// Payment `txid` from `sender` to `receiver`, funded by output 0 of `prev`.
pub fn funded_by(
    reader: FakeChainReader,
    txid: &str,
    prev: &str,
    sender: &str,
    receiver: &str,
) -> FakeChainReader {
    reader
        .with_raw_tx(raw_tx(txid, Some((prev, 0)), &[&[receiver]]))
        .with_raw_tx(raw_tx(prev, None, &[&[sender]]))
        .with_valid_address(sender)
}
