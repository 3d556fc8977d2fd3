use axum::{extract::FromRequestParts, http::request::Parts};

use rede_db::models::UserRow;

use crate::error::ApiError;
use crate::middleware::ServiceAccess;
use crate::session::SessionClaims;
use crate::state::AppState;

/// The active identity behind the request's session.
///
/// Reuses the claims the auth middleware already verified when present.
/// Bypass callers (trusted headers, API token) carry no identity and get 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserRow);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<SessionClaims>() {
            Some(claims) => state.sessions.load_identity(claims.user_id),
            None => state.sessions.current_user(&parts.headers),
        };
        user.map(AuthUser).ok_or_else(ApiError::unauthenticated)
    }
}

/// Admits only platform callers and API-token holders. User sessions get 403.
#[derive(Debug, Clone, Copy)]
pub struct ServiceCaller;

impl<S: Send + Sync> FromRequestParts<S> for ServiceCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<ServiceAccess>() {
            Some(_) => Ok(ServiceCaller),
            None => {
                tracing::warn!(path = %parts.uri.path(), "Admin route refused for a user session");
                Err(ApiError::forbidden("admin access required"))
            }
        }
    }
}
