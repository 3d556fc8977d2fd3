use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::session::API_TOKEN_CONFIG;
use crate::state::AppState;

/// Set by the platform scheduler on cron-triggered requests.
pub const CRON_HEADER: &str = "x-appengine-cron";
/// Set by the platform task queue; any non-empty value is trusted.
pub const QUEUE_HEADER: &str = "x-appengine-queuename";

/// Marks a request let in by a trusted header or the API token rather than
/// a user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceAccess;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn is_trusted_caller(headers: &HeaderMap) -> bool {
    let cron = headers
        .get(CRON_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true");
    let queue = headers
        .get(QUEUE_HEADER)
        .is_some_and(|v| !v.is_empty());
    cron || queue
}

fn api_token_matches(state: &AppState, req: &Request) -> bool {
    let Ok(Query(query)) = Query::<TokenQuery>::try_from_uri(req.uri()) else {
        return false;
    };
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return false;
    };
    match state.db.get_config(API_TOKEN_CONFIG) {
        Ok(Some(expected)) if !expected.is_empty() => expected == token,
        Ok(_) => false,
        Err(e) => {
            warn!("Failed to read API token: {}", e);
            false
        }
    }
}

/// Guards every protected route.
///
/// Trusted platform callers and requests carrying the configured API token
/// pass straight through. Everyone else needs a valid session; on success a
/// fresh credential is minted and returned in the response `Authorization`
/// header. A failed re-mint rejects the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_trusted_caller(req.headers()) {
        debug!(path = %req.uri().path(), "Trusted caller bypass");
        req.extensions_mut().insert(ServiceAccess);
        return Ok(next.run(req).await);
    }

    if api_token_matches(&state, &req) {
        debug!(path = %req.uri().path(), "API token bypass");
        req.extensions_mut().insert(ServiceAccess);
        return Ok(next.run(req).await);
    }

    let claims = state
        .sessions
        .resolve(req.headers())
        .ok_or_else(ApiError::unauthenticated)?;

    let renewed = state.sessions.create_session(claims.user_id).map_err(|e| {
        warn!(user_id = claims.user_id, "Session renewal failed: {}", e);
        ApiError::unauthenticated()
    })?;
    let renewed = HeaderValue::from_str(&renewed).map_err(|_| ApiError::unauthenticated())?;

    req.extensions_mut().insert(claims);
    let mut response = next.run(req).await;
    response.headers_mut().insert(header::AUTHORIZATION, renewed);
    Ok(response)
}
