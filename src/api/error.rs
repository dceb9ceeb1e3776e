//! Mapping of chain and resolution failures to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::chain::ChainError;
use crate::exchange::ResolutionError;
use crate::rpc::RpcError;

/// Error returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Chain(e) | ApiError::Resolution(ResolutionError::Chain(e)) => chain_status(e),
            ApiError::Resolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

fn chain_status(error: &ChainError) -> StatusCode {
    match error {
        ChainError::NotFound(_) => StatusCode::NOT_FOUND,
        ChainError::Rpc(RpcError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        ChainError::Rpc(_) | ChainError::Decode { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Node lookup failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(ChainError::NotFound("gettransaction t1".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let timeout = ApiError::from(ChainError::Rpc(RpcError::Timeout(30)));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let node = ApiError::from(ChainError::Rpc(RpcError::Transport("refused".into())));
        assert_eq!(node.status(), StatusCode::BAD_GATEWAY);

        let unresolved = ApiError::from(ResolutionError::NoInputs { txid: "t1".into() });
        assert_eq!(unresolved.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let nested = ApiError::from(ResolutionError::Chain(ChainError::NotFound("t1".into())));
        assert_eq!(nested.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_message_is_inner_error() {
        let err = ApiError::from(ResolutionError::NoInputs { txid: "t1".into() });
        let inner = ResolutionError::NoInputs { txid: "t1".into() };
        assert_eq!(err.to_string(), inner.to_string());

        let err: ApiError = ChainError::NotFound("getassetdata GOLD".into()).into();
        assert_eq!(err.to_string(), "Not found: getassetdata GOLD");
    }
}
