use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::{info, warn};

use rede_db::Database;
use rede_db::models::{UserFilter, UserRow};
use rede_types::api::{ChangePasswordRequest, MessageResponse, UpdateUserRequest, UserQuery};
use rede_types::errors::ErrorCode;
use rede_types::models::User;

use crate::auth::{ensure_email_free, ensure_nick_free};
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::validation::is_valid_email;

pub(crate) fn load_user(db: &Database, id: i64) -> Result<UserRow, ApiError> {
    db.get_user(id)?.ok_or_else(|| ApiError::not_found("user"))
}

fn ensure_owner(caller: &UserRow, id: i64) -> Result<(), ApiError> {
    if caller.id != id {
        warn!(user_id = caller.id, target = id, "Refusing to act on another user's account");
        return Err(ApiError::forbidden("you can only change your own account"));
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let ids = state.db.filter_users(&UserFilter {
        id: query.id,
        name: query.name,
        nick: query.nick,
        email: query.email,
    })?;
    let users = state.db.get_users(&ids)?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(load_user(&state.db, id)?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    ensure_owner(&caller, id)?;
    let user = update_user(&state.db, id, req)?;
    info!(user_id = id, "Profile updated");
    Ok(Json(user.into()))
}

/// Applies the set fields of `req`. Unset or blank fields keep their value.
pub fn update_user(db: &Database, id: i64, req: UpdateUserRequest) -> Result<UserRow, ApiError> {
    let mut user = load_user(db, id)?;

    let set = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(name) = set(req.name) {
        user.name = name;
    }
    if let Some(nick) = set(req.nick) {
        if nick != user.nick {
            ensure_nick_free(db, &nick, Some(id))?;
        }
        user.nick = nick;
    }
    if let Some(email) = set(req.email) {
        if !is_valid_email(&email) {
            return Err(ApiError::bad_request(ErrorCode::InvalidEmail));
        }
        if email != user.email {
            ensure_email_free(db, &email, Some(id))?;
        }
        user.email = email;
    }

    db.put_user(&mut user)?;
    Ok(user)
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_owner(&caller, id)?;
    if !state.db.delete_user(id)? {
        return Err(ApiError::not_found("user"));
    }
    info!(user_id = id, "Account deleted");
    Ok(Json(MessageResponse::new("account deleted")))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_owner(&caller, id)?;

    if !verify_password(&req.current, &caller.password) {
        warn!(user_id = id, "Password change with wrong current password");
        return Err(ApiError::unauthorized(ErrorCode::WrongPassword));
    }
    if req.new.is_empty() {
        return Err(ApiError::bad_request(ErrorCode::InvalidPassword));
    }

    let mut user = caller;
    user.password = hash_password(&req.new)?;
    state.db.put_user(&mut user).map_err(|e| {
        tracing::error!(user_id = id, "Failed to store new password: {}", e);
        ApiError::bad_request(ErrorCode::PasswordReset)
    })?;

    info!(user_id = id, "Password changed");
    Ok(Json(MessageResponse::new("password changed")))
}

/// Flags the account inactive. Its sessions stop resolving immediately.
pub async fn deactivate(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_owner(&caller, id)?;
    let mut user = caller;
    user.inactive = true;
    state.db.put_user(&mut user)?;
    info!(user_id = id, "Account deactivated");
    Ok(Json(MessageResponse::new("account deactivated")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, signed_user};

    #[test]
    fn update_keeps_unset_fields_and_checks_uniqueness() {
        let db = seeded_db();
        let ana = signed_user(&db, "ana");
        signed_user(&db, "bia");

        let updated = update_user(
            &db,
            ana.id,
            UpdateUserRequest {
                name: Some("Ana Maria".into()),
                nick: Some(" ".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.nick, "ana");
        assert_eq!(updated.email, ana.email);

        let err = update_user(
            &db,
            ana.id,
            UpdateUserRequest {
                nick: Some("bia".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { code: ErrorCode::NickTaken, .. }));

        // Re-submitting your own email is not a conflict.
        update_user(
            &db,
            ana.id,
            UpdateUserRequest {
                email: Some(ana.email.clone()),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn update_of_missing_user_is_not_found() {
        let db = seeded_db();
        let err = update_user(&db, 404, UpdateUserRequest::default()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { code: ErrorCode::NotFound, .. }));
    }
}
