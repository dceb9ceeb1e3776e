use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::chain::{AssetData, BlockchainInfo, RawTransaction, TxOut, WalletTransaction};
use crate::exchange::{LedgerEntry, LedgerSummary, TransactionClassification};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub node_endpoint: String,
    pub rvn_policy: bool,
    pub asset_policy: bool,
    pub ledger: LedgerSummary,
}

#[derive(Serialize)]
pub struct LedgerRow {
    pub txid: String,
    #[serde(flatten)]
    pub entry: LedgerEntry,
}

#[derive(Serialize)]
pub struct Confirmations {
    pub txid: String,
    pub n: u32,
    pub confirmations: i64,
}

#[derive(Deserialize)]
pub struct OutputQuery {
    #[serde(default)]
    pub n: u32,
}

#[derive(Serialize)]
pub struct Sender {
    pub txid: String,
    pub sender: String,
}

#[derive(Serialize)]
pub struct Classification {
    pub txid: String,
    #[serde(flatten)]
    pub classification: TransactionClassification,
}

#[derive(Serialize)]
pub struct BlockCount {
    pub blocks: u64,
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> Result<Json<WalletTransaction>, ApiError> {
    Ok(Json(state.reader.get_wallet_transaction(&txid).await?))
}

pub async fn get_public_transaction(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> Result<Json<RawTransaction>, ApiError> {
    Ok(Json(state.reader.get_public_transaction(&txid).await?))
}

pub async fn get_tx_out(
    State(state): State<AppState>,
    Path((txid, n)): Path<(String, u32)>,
) -> Result<Json<TxOut>, ApiError> {
    Ok(Json(state.reader.get_tx_out(&txid, n).await?))
}

pub async fn get_confirmations(
    State(state): State<AppState>,
    Path(txid): Path<String>,
    Query(query): Query<OutputQuery>,
) -> Result<Json<Confirmations>, ApiError> {
    let confirmations = state
        .reader
        .get_transaction_confirmations(&txid, query.n)
        .await?;
    Ok(Json(Confirmations {
        txid,
        n: query.n,
        confirmations,
    }))
}

pub async fn get_sender(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> Result<Json<Sender>, ApiError> {
    let sender = state.resolver.resolve_sender(&txid).await?;
    Ok(Json(Sender { txid, sender }))
}

pub async fn get_classification(
    State(state): State<AppState>,
    Path(txid): Path<String>,
) -> Result<Json<Classification>, ApiError> {
    let classification = state.classifier.classify(&txid).await?;
    Ok(Json(Classification {
        txid,
        classification,
    }))
}

pub async fn get_asset(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AssetData>, ApiError> {
    Ok(Json(state.reader.get_asset_data(&name).await?))
}

pub async fn get_blockchain_info(
    State(state): State<AppState>,
) -> Result<Json<BlockchainInfo>, ApiError> {
    Ok(Json(state.reader.get_blockchain_info().await?))
}

pub async fn get_block_count(State(state): State<AppState>) -> Result<Json<BlockCount>, ApiError> {
    let blocks = state.reader.get_block_count().await?;
    Ok(Json(BlockCount { blocks }))
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        node_endpoint: state.node_endpoint.clone(),
        rvn_policy: state.rvn_policy,
        asset_policy: state.asset_policy,
        ledger: state.current_ledger().summary(),
    })
}

pub async fn get_ledger(State(state): State<AppState>) -> Json<Vec<LedgerRow>> {
    Json(
        state
            .current_ledger()
            .entries()
            .into_iter()
            .map(|(txid, entry)| LedgerRow { txid, entry })
            .collect(),
    )
}
