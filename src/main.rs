//! Wallet-notify hook.
//!
//! Run once per transaction by the node, e.g.
//! `walletnotify=/usr/local/bin/asset-sender --config /etc/asset-sender.toml %s`.
//!
//! ```text
//!   node ──walletnotify──▶ asset-sender <txid>
//!                              │
//!                              ▼
//!                        IncomingHandler ──▶ ledger (dedup)
//!                              │
//!            ┌─────────────────┼─────────────────┐
//!            ▼                 ▼                 ▼
//!       Classifier      ExchangeEngine     BacktraceResolver
//!            └─────────────────┼─────────────────┘
//!                              ▼
//!                     NodeChainReader ──▶ RpcClient ──▶ node JSON-RPC
//! ```
//!
//! Exit status is 0 when the transaction was exchanged, skipped or already
//! handled, and 1 on any failure, including a transfer whose ledger record
//! could not be saved.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use asset_sender::chain::{ChainReader, NodeChainReader};
use asset_sender::config::load_config;
use asset_sender::exchange::{ExchangeError, ExchangeLedger, HandleOutcome, IncomingHandler};
use asset_sender::observability::logging;
use asset_sender::rpc::RpcClient;

#[derive(Parser)]
#[command(name = "asset-sender", version)]
#[command(about = "Answer incoming Ravencoin payments with asset transfers", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "asset-sender.toml")]
    config: PathBuf,

    /// Wallet transaction id, as passed by walletnotify.
    txid: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("asset-sender: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("asset-sender: logging: {}", e);
        return ExitCode::FAILURE;
    }

    let client = match RpcClient::new(&config.node) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create RPC client");
            return ExitCode::FAILURE;
        }
    };
    let ledger = match ExchangeLedger::open(&config.ledger) {
        Ok(ledger) => ledger,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open exchange ledger");
            return ExitCode::FAILURE;
        }
    };

    let reader: Arc<dyn ChainReader> = Arc::new(NodeChainReader::new(client));
    let handler = IncomingHandler::from_config(reader, &config.exchange, ledger);

    let txid = cli.txid.trim();
    tracing::info!(txid = %txid, "Incoming transaction");

    match handler.handle(txid).await {
        Ok(HandleOutcome::Exchanged(receipt)) => {
            match serde_json::to_string(&receipt) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize receipt"),
            }
            ExitCode::SUCCESS
        }
        Ok(HandleOutcome::Skipped { classification }) => {
            tracing::info!(txid = %txid, classification = %classification, "Skipped");
            ExitCode::SUCCESS
        }
        Ok(HandleOutcome::Duplicate { status }) => {
            tracing::info!(txid = %txid, status = ?status, "Duplicate");
            ExitCode::SUCCESS
        }
        Err(ExchangeError::LedgerWrite { receipt, message }) => {
            tracing::error!(
                txid = %txid,
                error = %message,
                asset = %receipt.asset,
                quantity = receipt.quantity,
                recipient = %receipt.recipient,
                dispatched = ?receipt.dispatched_txids,
                "Transfer dispatched but not recorded in the ledger"
            );
            if let Ok(json) = serde_json::to_string(&receipt) {
                println!("{}", json);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(
                txid = %txid,
                error = %e,
                nothing_sent = e.nothing_sent(),
                "Exchange failed"
            );
            ExitCode::FAILURE
        }
    }
}
