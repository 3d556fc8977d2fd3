//! Follow graph. One record per followed identity lists its followers.
//!
//! Follow and unfollow are read-modify-write over that record with no guard:
//! two concurrent writers on the same target can lose an update.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use rede_db::Database;
use rede_db::models::FollowersRow;
use rede_types::api::MessageResponse;
use rede_types::errors::ErrorCode;
use rede_types::models::User;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;
use crate::users::load_user;

/// Adds `follower_id` to `target_id`'s followers.
pub fn follow(
    db: &Database,
    follower_id: i64,
    target_id: i64,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    if follower_id == target_id {
        return Err(ApiError::forbidden("you cannot follow yourself"));
    }
    load_user(db, target_id)?;

    let record = match db.get_followers(target_id)? {
        None => FollowersRow {
            user_id: target_id,
            follower_ids: vec![follower_id],
            created_at: now,
        },
        Some(mut record) => {
            if record.follower_ids.contains(&follower_id) {
                return Err(ApiError::bad_request_msg(
                    ErrorCode::Generic,
                    "you already follow this user",
                ));
            }
            record.follower_ids.push(follower_id);
            record
        }
    };

    db.put_followers(&record)?;
    Ok(())
}

/// Removes `follower_id` from `target_id`'s followers. A target nobody
/// follows is left untouched.
pub fn unfollow(db: &Database, follower_id: i64, target_id: i64) -> Result<(), ApiError> {
    if follower_id == target_id {
        return Err(ApiError::forbidden("you cannot unfollow yourself"));
    }
    let Some(mut record) = db.get_followers(target_id)? else {
        return Ok(());
    };

    record.follower_ids = record
        .follower_ids
        .into_iter()
        .filter(|id| *id != follower_id)
        .collect();
    db.put_followers(&record)?;
    Ok(())
}

pub async fn follow_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    follow(&state.db, caller.id, id, state.sessions.now()).inspect_err(|e| {
        warn!(user_id = caller.id, target = id, "Follow rejected: {}", e);
    })?;
    info!(user_id = caller.id, target = id, "Followed");
    Ok(Json(MessageResponse::new("followed")))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    unfollow(&state.db, caller.id, id)?;
    info!(user_id = caller.id, target = id, "Unfollowed");
    Ok(Json(MessageResponse::new("unfollowed")))
}

/// Who follows `{id}`.
pub async fn followers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<User>>, ApiError> {
    load_user(&state.db, id)?;
    let ids = state
        .db
        .get_followers(id)?
        .map(|record| record.follower_ids)
        .unwrap_or_default();
    let users = state.db.get_users(&ids)?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

/// Whom `{id}` follows.
pub async fn following(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<User>>, ApiError> {
    load_user(&state.db, id)?;
    let ids = state.db.followed_by(id)?;
    let users = state.db.get_users(&ids)?;
    Ok(Json(users.into_iter().map(User::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, signed_user};

    #[test]
    fn follow_twice_is_rejected_and_record_unchanged() {
        let db = seeded_db();
        let ana = signed_user(&db, "ana");
        let bia = signed_user(&db, "bia");

        follow(&db, bia.id, ana.id, Utc::now()).unwrap();
        let before = db.get_followers(ana.id).unwrap().unwrap();

        let err = follow(&db, bia.id, ana.id, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
        assert_eq!(db.get_followers(ana.id).unwrap().unwrap(), before);
        assert_eq!(before.follower_ids, vec![bia.id]);
    }

    #[test]
    fn unfollow_without_record_is_a_no_op() {
        let db = seeded_db();
        let ana = signed_user(&db, "ana");
        let bia = signed_user(&db, "bia");

        unfollow(&db, bia.id, ana.id).unwrap();
        assert!(db.get_followers(ana.id).unwrap().is_none());
    }

    #[test]
    fn unfollow_of_non_follower_leaves_record_unchanged() {
        let db = seeded_db();
        let ana = signed_user(&db, "ana");
        let bia = signed_user(&db, "bia");
        let cid = signed_user(&db, "cid");

        follow(&db, bia.id, ana.id, Utc::now()).unwrap();
        unfollow(&db, cid.id, ana.id).unwrap();
        assert_eq!(db.get_followers(ana.id).unwrap().unwrap().follower_ids, vec![bia.id]);

        unfollow(&db, bia.id, ana.id).unwrap();
        assert!(db.get_followers(ana.id).unwrap().unwrap().follower_ids.is_empty());
    }

    #[test]
    fn self_follow_and_unknown_target() {
        let db = seeded_db();
        let ana = signed_user(&db, "ana");

        assert!(matches!(follow(&db, ana.id, ana.id, Utc::now()), Err(ApiError::Forbidden(_))));
        let err = follow(&db, ana.id, 999, Utc::now()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { code: ErrorCode::NotFound, .. }));
    }
}
