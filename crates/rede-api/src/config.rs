use axum::{
    Form, Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use rede_types::api::{ConfigForm, ConfigQuery, MessageResponse};
use rede_types::models::Config;

use crate::error::ApiError;
use crate::extract::ServiceCaller;
use crate::session::{API_TOKEN_CONFIG, SIGNING_KEY_CONFIG};
use crate::state::AppState;

/// Entries never returned over HTTP.
const HIDDEN: [&str; 2] = [SIGNING_KEY_CONFIG, API_TOKEN_CONFIG];

/// `?nome=` returns one value, no parameter lists them all. Service callers
/// only; the signing key and the API token are never returned.
pub async fn get(
    _caller: ServiceCaller,
    State(state): State<AppState>,
    Query(query): Query<ConfigQuery>,
) -> Result<Response, ApiError> {
    match query.nome.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        Some(name) => {
            if HIDDEN.contains(&name.as_str()) {
                return Err(ApiError::not_found("config"));
            }
            let value = state
                .db
                .get_config(&name)?
                .ok_or_else(|| ApiError::not_found("config"))?;
            Ok(Json(Config { name, value }).into_response())
        }
        None => {
            let configs: Vec<Config> = state
                .db
                .list_configs()?
                .into_iter()
                .filter(|c| !HIDDEN.contains(&c.name.as_str()))
                .map(Config::from)
                .collect();
            Ok(Json(configs).into_response())
        }
    }
}

/// Upserts one entry. The signing key is only set at server startup.
pub async fn put(
    _caller: ServiceCaller,
    State(state): State<AppState>,
    Form(form): Form<ConfigForm>,
) -> Result<Json<MessageResponse>, ApiError> {
    let name = form.nome.trim();
    let value = form.valor.trim();
    if name.is_empty() || value.is_empty() {
        return Err(ApiError::bad_request_msg(
            rede_types::errors::ErrorCode::Generic,
            "nome and valor are required",
        ));
    }

    if name == SIGNING_KEY_CONFIG {
        warn!("Refused write to the signing key");
        return Err(ApiError::forbidden("signing key is not writable"));
    }

    state.db.put_config(name, value)?;
    info!(config = name, "Config updated");
    Ok(Json(MessageResponse::new("config saved")))
}
