//! Read-only HTTP API over the node, plus an authenticated admin surface.
//!
//! # Routes
//! ```text
//! GET /api/transactions/{txid}                     wallet transaction
//! GET /api/transactions/{txid}/public              decoded raw transaction
//! GET /api/transactions/{txid}/txout/{n}           unspent output
//! GET /api/transactions/{txid}/confirmations?n=0   output confirmations
//! GET /api/transactions/{txid}/sender              backtraced sender
//! GET /api/transactions/{txid}/classification      kind and direction
//! GET /api/assets/{name}                           asset metadata
//! GET /api/blockchain/info                         chain summary
//! GET /api/blockchain/blockcount                   chain height
//! GET /admin/status                                (bearer) process status
//! GET /admin/ledger                                (bearer) exchange ledger
//! ```

pub mod auth;
pub mod error;
pub mod handlers;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::chain::ChainReader;
use crate::config::SenderConfig;
use crate::exchange::{BacktraceResolver, Classifier, ExchangeLedger, SenderResolver};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

pub use error::ApiError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<dyn ChainReader>,
    pub classifier: Classifier,
    pub resolver: Arc<dyn SenderResolver>,
    pub ledger: ExchangeLedger,
    pub api_key: Arc<str>,
    pub node_endpoint: String,
    pub rvn_policy: bool,
    pub asset_policy: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        config: &SenderConfig,
        ledger: ExchangeLedger,
    ) -> Self {
        Self {
            classifier: Classifier::new(reader.clone()),
            resolver: Arc::new(BacktraceResolver::new(reader.clone())),
            reader,
            ledger,
            api_key: Arc::from(config.api.api_key.as_str()),
            node_endpoint: format!("{}:{}", config.node.host, config.node.port),
            rvn_policy: config.exchange.rvn.is_some(),
            asset_policy: config.exchange.asset.is_some(),
            started_at: Instant::now(),
        }
    }

    /// The ledger as last persisted. The hook process owns the file, so it is
    /// re-read on every call.
    pub fn current_ledger(&self) -> ExchangeLedger {
        let Some(path) = self.ledger.persistence_path() else {
            return self.ledger.clone();
        };
        ExchangeLedger::load_from_file(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read exchange ledger");
            self.ledger.clone()
        })
    }
}

/// Build the router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let admin = Router::new()
        .route("/admin/status", get(handlers::get_status))
        .route("/admin/ledger", get(handlers::get_ledger))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::admin_auth));

    Router::new()
        .route("/api/transactions/{txid}", get(handlers::get_transaction))
        .route(
            "/api/transactions/{txid}/public",
            get(handlers::get_public_transaction),
        )
        .route("/api/transactions/{txid}/txout/{n}", get(handlers::get_tx_out))
        .route(
            "/api/transactions/{txid}/confirmations",
            get(handlers::get_confirmations),
        )
        .route("/api/transactions/{txid}/sender", get(handlers::get_sender))
        .route(
            "/api/transactions/{txid}/classification",
            get(handlers::get_classification),
        )
        .route("/api/assets/{name}", get(handlers::get_asset))
        .route("/api/blockchain/info", get(handlers::get_blockchain_info))
        .route("/api/blockchain/blockcount", get(handlers::get_block_count))
        .merge(admin)
        .route_layer(middleware::from_fn(track_requests))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let response = next.run(request).await;
    metrics::record_api_request(&endpoint, response.status().as_u16());
    response
}

/// Serve `router` until `shutdown` fires, then drain in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: &Shutdown,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "API server starting");

    let mut stop = shutdown.subscribe();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = stop.recv().await;
        })
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
