//! Read-only HTTP API over the node.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use asset_sender::api::{self, AppState};
use asset_sender::chain::{ChainReader, NodeChainReader};
use asset_sender::config::load_config;
use asset_sender::exchange::ExchangeLedger;
use asset_sender::lifecycle::{wait_for_signal, Shutdown};
use asset_sender::observability::{logging, metrics};
use asset_sender::rpc::RpcClient;

#[derive(Parser)]
#[command(name = "asset-api", version)]
#[command(about = "HTTP API for transaction, asset and exchange lookups", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "asset-sender.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "asset-api starting");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let client = RpcClient::new(&config.node)?;
    tracing::info!(endpoint = %client.endpoint(), "Node configured");
    let reader: Arc<dyn ChainReader> = Arc::new(NodeChainReader::new(client));
    let ledger = ExchangeLedger::open(&config.ledger)?;

    let state = AppState::new(reader, &config, ledger);
    let router = api::build_router(state, Duration::from_secs(config.api.request_timeout_secs));

    let listener = TcpListener::bind(&config.api.bind_address).await?;
    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    api::serve(listener, router, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
