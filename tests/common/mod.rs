//! Shared utilities for integration testing: an in-process mock node.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use asset_sender::config::NodeConfig;

pub const RPC_USER: &str = "rpcuser";
pub const RPC_PASSWORD: &str = "rpcpass";
/// `Basic base64("rpcuser:rpcpass")`.
const EXPECTED_AUTH: &str = "Basic cnBjdXNlcjpycGNwYXNz";

/// Canned node state, answered over JSON-RPC.
#[derive(Default)]
pub struct MockNode {
    pub wallet: HashMap<String, Value>,
    /// Decoded transactions; their raw hex is `hex-<txid>`.
    pub raw: HashMap<String, Value>,
    pub balances: HashMap<String, f64>,
    pub valid_addresses: Vec<String>,
    pub reject_transfers: bool,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockNode {
    pub fn with_wallet_tx(mut self, tx: Value) -> Self {
        let txid = tx["txid"].as_str().unwrap_or_default().to_string();
        self.wallet.insert(txid, tx);
        self
    }

    pub fn with_raw_tx(mut self, tx: Value) -> Self {
        let txid = tx["txid"].as_str().unwrap_or_default().to_string();
        self.raw.insert(txid, tx);
        self
    }

    pub fn with_balance(mut self, asset: &str, balance: f64) -> Self {
        self.balances.insert(asset.to_string(), balance);
        self
    }

    pub fn with_valid_address(mut self, address: &str) -> Self {
        self.valid_addresses.push(address.to_string());
        self
    }

    /// `txid` paying `receiver`, funded by output 0 of `prev`, owned by `sender`.
    pub fn with_payment(self, txid: &str, prev: &str, sender: &str, receiver: &str) -> Self {
        self.with_raw_tx(decoded(txid, Some((prev, 0)), &[&[receiver]]))
            .with_raw_tx(decoded(prev, None, &[&[sender]]))
            .with_valid_address(sender)
    }

    /// Methods called, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// Params of every call to `method`.
    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, (i64, String)> {
        let str_param = |name: &str| params[name].as_str().unwrap_or_default().to_string();
        match method {
            "gettransaction" => self
                .wallet
                .get(&str_param("txid"))
                .cloned()
                .ok_or((-5, "Invalid or non-wallet transaction id".into())),
            "getrawtransaction" => {
                let txid = str_param("txid");
                if self.raw.contains_key(&txid) {
                    Ok(json!(format!("hex-{}", txid)))
                } else {
                    Err((-5, "No such mempool or blockchain transaction".into()))
                }
            }
            "decoderawtransaction" => str_param("hexstring")
                .strip_prefix("hex-")
                .and_then(|txid| self.raw.get(txid))
                .cloned()
                .ok_or((-22, "TX decode failed".into())),
            "gettxout" => {
                let txid = str_param("txid");
                let n = params["n"].as_u64().unwrap_or_default();
                let confirmations = self.wallet.get(&txid).map(|tx| tx["confirmations"].clone());
                let output = self.raw.get(&txid).and_then(|tx| {
                    tx["vout"]
                        .as_array()?
                        .iter()
                        .find(|o| o["n"].as_u64() == Some(n))
                        .cloned()
                });
                Ok(match output {
                    Some(o) => json!({
                        "bestblock": "00".repeat(32),
                        "confirmations": confirmations.unwrap_or(json!(1)),
                        "value": o["value"],
                        "scriptPubKey": o["scriptPubKey"],
                        "coinbase": false
                    }),
                    None => Value::Null,
                })
            }
            "listmyassets" => {
                let asset = str_param("asset");
                let mut balances = serde_json::Map::new();
                if let Some(balance) = self.balances.get(&asset) {
                    balances.insert(asset, json!(balance));
                }
                Ok(Value::Object(balances))
            }
            "validateaddress" => {
                let address = str_param("address");
                if self.valid_addresses.contains(&address) {
                    Ok(json!({"isvalid": true, "address": address, "ismine": false}))
                } else {
                    Ok(json!({"isvalid": false}))
                }
            }
            "transfer" => {
                if self.reject_transfers {
                    Err((-6, "Insufficient funds".into()))
                } else {
                    let n = self.params_of("transfer").len();
                    Ok(json!([format!("dispatched-{}", n)]))
                }
            }
            "getblockcount" => Ok(json!(1234)),
            "getblockchaininfo" => Ok(json!({
                "chain": "main",
                "blocks": 1234,
                "headers": 1234,
                "bestblockhash": "00".repeat(32),
                "difficulty": 1.5,
                "pruned": false
            })),
            "getassetdata" => Ok(Value::Null),
            _ => Err((-32601, "Method not found".into())),
        }
    }
}

async fn rpc(
    State(node): State<Arc<MockNode>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == EXPECTED_AUTH);
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body["jsonrpc"] != "2.0" || !body["id"].is_string() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let method = body["method"].as_str().unwrap_or_default().to_string();
    let params = body["params"].clone();
    node.calls.lock().unwrap().push((method.clone(), params.clone()));

    match node.answer(&method, &params) {
        Ok(result) => {
            Json(json!({"result": result, "error": null, "id": body["id"]})).into_response()
        }
        Err((code, message)) => {
            let error = json!({"code": code, "message": message});
            let envelope = json!({"result": null, "error": error, "id": body["id"]});
            (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response()
        }
    }
}

/// Serve `node` on an ephemeral port.
pub async fn start_mock_node(node: MockNode) -> (SocketAddr, Arc<MockNode>) {
    let node = Arc::new(node);
    let app = Router::new().route("/", post(rpc)).with_state(node.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, node)
}

pub fn node_config(addr: SocketAddr) -> NodeConfig {
    NodeConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        username: RPC_USER.to_string(),
        password: RPC_PASSWORD.to_string(),
        timeout_secs: 5,
    }
}

pub fn wallet_rvn_receive(txid: &str, address: &str, amount: f64, confirmations: i64) -> Value {
    json!({
        "txid": txid,
        "amount": amount,
        "confirmations": confirmations,
        "details": [
            {"account": "", "address": address, "category": "receive", "amount": amount, "vout": 0}
        ],
        "asset_details": []
    })
}

pub fn wallet_asset_receive(
    txid: &str,
    address: &str,
    asset: &str,
    amount: f64,
    confirmations: i64,
) -> Value {
    json!({
        "txid": txid,
        "amount": 0,
        "confirmations": confirmations,
        "details": [],
        "asset_details": [{
            "asset_type": "transfer_asset",
            "asset_name": asset,
            "amount": amount,
            "destination": address,
            "vout": 0,
            "category": "receive"
        }]
    })
}

/// Decoded transaction spending `input`, one output per address list.
pub fn decoded(txid: &str, input: Option<(&str, u32)>, outputs: &[&[&str]]) -> Value {
    let vin: Vec<Value> = input
        .map(|(prev, vout)| json!({"txid": prev, "vout": vout, "sequence": 4294967294u32}))
        .into_iter()
        .collect();
    let vout: Vec<Value> = outputs
        .iter()
        .enumerate()
        .map(|(n, addresses)| {
            json!({
                "value": 1.0,
                "n": n,
                "scriptPubKey": {"type": "pubkeyhash", "addresses": addresses}
            })
        })
        .collect();
    json!({"txid": txid, "vin": vin, "vout": vout})
}
