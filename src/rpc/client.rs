//! Node JSON-RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - POST JSON-RPC requests to the node with HTTP Basic auth
//! - Bound every call with the configured timeout
//! - Decode the JSON-RPC envelope into a result or a typed error
//!
//! Calls are never retried here: a failed call surfaces immediately.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;
use uuid::Uuid;

use crate::config::NodeConfig;
use crate::observability::metrics;
use crate::rpc::types::{decode_response, RpcError, RpcRequest, RpcResult};

/// Executes named RPC methods against the node.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Invoke `method` with named `params` and return the raw `result`.
    async fn invoke(&self, method: &str, params: Value) -> RpcResult<Value>;
}

/// HTTP JSON-RPC client for a single node.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a new client from the node configuration.
    pub fn new(config: &NodeConfig) -> RpcResult<Self> {
        let endpoint = Url::parse(&format!("http://{}:{}/", config.host, config.port))
            .map_err(|e| {
                RpcError::InvalidEndpoint(format!("{}:{}: {}", config.host, config.port, e))
            })?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        tracing::debug!(endpoint = %endpoint, timeout_secs = config.timeout_secs, "RPC client initialized");

        Ok(Self {
            http,
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
            timeout_duration: Duration::from_secs(config.timeout_secs),
        })
    }

    /// The node endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, request: &RpcRequest<'_>) -> RpcResult<(u16, String)> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        Ok((status, body))
    }
}

#[async_trait]
impl RpcGateway for RpcClient {
    async fn invoke(&self, method: &str, params: Value) -> RpcResult<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: Uuid::new_v4().to_string(),
            method,
            params,
        };
        let start = Instant::now();

        let result = match timeout(self.timeout_duration, self.send(&request)).await {
            Ok(Ok((status, body))) => decode_response(status, &body),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RpcError::Timeout(self.timeout_duration.as_secs())),
        };

        match &result {
            Ok(_) => {
                tracing::debug!(method = method, id = %request.id, "RPC call succeeded");
                metrics::record_rpc_call(method, "ok", start);
            }
            Err(e) => {
                tracing::warn!(method = method, id = %request.id, error = %e, "RPC call failed");
                metrics::record_rpc_call(method, "error", start);
            }
        }

        result
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
