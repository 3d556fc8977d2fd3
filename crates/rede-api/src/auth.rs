use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use rede_db::Database;
use rede_db::models::{UserFilter, UserRow};
use rede_types::api::{LoginRequest, LoginResponse, RegisterRequest};
use rede_types::errors::ErrorCode;
use rede_types::models::User;

use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::validation::is_valid_email;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = create_user(&state.db, req, state.sessions.now())?;
    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(User::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = req.email.trim();
    let ids = state.db.filter_users(&UserFilter {
        email: Some(email.to_string()),
        ..Default::default()
    })?;

    let user = match ids.first() {
        Some(id) => state.db.get_user(*id)?,
        None => None,
    };
    let Some(user) = user.filter(|u| !u.inactive) else {
        warn!("Login failed: no active user for the given email");
        return Err(ApiError::unauthorized(ErrorCode::WrongPassword));
    };

    if !verify_password(&req.password, &user.password) {
        warn!(user_id = user.id, "Login failed: wrong password");
        return Err(ApiError::unauthorized(ErrorCode::WrongPassword));
    }

    let token = state.sessions.create_session(user.id)?;
    let header_value = HeaderValue::from_str(&token)
        .map_err(|e| anyhow::anyhow!("credential is not a valid header value: {}", e))?;

    info!(user_id = user.id, "User logged in");
    let mut response = Json(LoginResponse { id: user.id, token }).into_response();
    response.headers_mut().insert(header::AUTHORIZATION, header_value);
    Ok(response)
}

/// Validates and stores a new identity. Nick and email must be unused.
pub fn create_user(
    db: &Database,
    req: RegisterRequest,
    now: DateTime<Utc>,
) -> Result<UserRow, ApiError> {
    let name = req.name.trim().to_string();
    let nick = req.nick.trim().to_string();
    let email = req.email.trim().to_string();

    if name.is_empty() || nick.is_empty() || email.is_empty() {
        return Err(ApiError::bad_request_msg(
            ErrorCode::InvalidUser,
            "name, nick and email are required",
        ));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request(ErrorCode::InvalidPassword));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request(ErrorCode::InvalidEmail));
    }

    ensure_nick_free(db, &nick, None)?;
    ensure_email_free(db, &email, None)?;

    let mut user = UserRow {
        id: 0,
        name,
        nick,
        email,
        password: hash_password(&req.password)?,
        inactive: false,
        created_at: now,
    };
    db.put_user(&mut user)
        .map_err(|e| {
            tracing::error!("Failed to insert user: {}", e);
            ApiError::bad_request(ErrorCode::InsertUser)
        })?;
    Ok(user)
}

/// Fails when another identity (other than `owner`) already uses `nick`.
pub fn ensure_nick_free(db: &Database, nick: &str, owner: Option<i64>) -> Result<(), ApiError> {
    let ids = db.filter_users(&UserFilter {
        nick: Some(nick.to_string()),
        ..Default::default()
    })?;
    if ids.iter().any(|id| Some(*id) != owner) {
        return Err(ApiError::bad_request(ErrorCode::NickTaken));
    }
    Ok(())
}

pub fn ensure_email_free(db: &Database, email: &str, owner: Option<i64>) -> Result<(), ApiError> {
    let ids = db.filter_users(&UserFilter {
        email: Some(email.to_string()),
        ..Default::default()
    })?;
    if ids.iter().any(|id| Some(*id) != owner) {
        return Err(ApiError::bad_request(ErrorCode::EmailTaken));
    }
    Ok(())
}
