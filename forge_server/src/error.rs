//! Orchestrator error taxonomy, recovered at the request boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Bad or missing shared secret, or unauthenticated human caller.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated caller lacks the required role or tenant scope.
    #[error("forbidden")]
    Forbidden,

    /// Unknown link id, slug, or ci_build_id. Callback NotFound may be a
    /// late replay for a pruned job; the gateway logs it and mutates
    /// nothing.
    #[error("not found")]
    NotFound,

    /// Rejected before touching the ledger.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The external CI system could not be reached at trigger time.
    #[error("dispatch failure: {0}")]
    DispatchFailure(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            OrchestratorError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            OrchestratorError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            OrchestratorError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            OrchestratorError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            OrchestratorError::DispatchFailure(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            OrchestratorError::Store(e) => {
                tracing::error!("store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
