use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use rede_types::errors::{ErrorBody, ErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("backend unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Upstream(e) => {
                error!("Backend request failed: {}", e);
                (StatusCode::BAD_GATEWAY, "backend unavailable")
            }
            Self::Internal(e) => {
                error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };
        let body = ErrorBody {
            error: message.to_string(),
            code: ErrorCode::Generic,
        };
        (status, Json(body)).into_response()
    }
}
