use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use rede_types::errors::{ErrorBody, ErrorCode};

use crate::session::SessionError;

/// Message sent for every authentication failure. Which check failed is
/// never disclosed.
pub const AUTH_INVALID: &str = "authentication invalid";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input, failed business rule or missing entity.
    #[error("{message}")]
    BadRequest { code: ErrorCode, message: String },

    #[error("{message}")]
    Unauthorized { code: ErrorCode, message: String },

    /// Authenticated, but acting on someone else's resource.
    #[error("{0}")]
    Forbidden(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    /// Session could not be minted (signing key missing, signing failed).
    #[error(transparent)]
    Session(SessionError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(code: ErrorCode) -> Self {
        Self::BadRequest {
            code,
            message: code.message().to_string(),
        }
    }

    pub fn bad_request_msg(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::bad_request_msg(ErrorCode::NotFound, format!("{} not found", what))
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthorized {
            code: ErrorCode::Generic,
            message: AUTH_INVALID.to_string(),
        }
    }

    pub fn unauthorized(code: ErrorCode) -> Self {
        Self::Unauthorized {
            code,
            message: code.message().to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, code) = match self {
            Self::BadRequest { code, message } | Self::Unauthorized { code, message } => {
                (message.clone(), *code)
            }
            Self::Forbidden(message) => (message.clone(), ErrorCode::Generic),
            Self::MethodNotAllowed => (self.to_string(), ErrorCode::Generic),
            Self::Session(e) => (e.code().message().to_string(), e.code()),
            Self::Internal(_) => ("internal error".to_string(), ErrorCode::Generic),
        };
        ErrorBody { error, code }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => error!("Request failed: {:#}", e),
            Self::Session(e) => error!("Session mint failed: {}", e),
            _ => {}
        }
        (self.status(), Json(self.body())).into_response()
    }
}
