use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use rede_db::Database;
use rede_db::models::{PostFilter, PostRow, UserRow};
use rede_types::api::{MessageResponse, PostRequest};
use rede_types::errors::ErrorCode;
use rede_types::models::Post;

use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;
use crate::users::load_user;

fn load_post(db: &Database, id: i64) -> Result<PostRow, ApiError> {
    db.get_post(id)?.ok_or_else(|| ApiError::not_found("post"))
}

fn validate(req: &PostRequest) -> Result<(String, String), ApiError> {
    let title = req.title.trim().to_string();
    let content = req.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return Err(ApiError::bad_request_msg(
            ErrorCode::Generic,
            "title and content are required",
        ));
    }
    Ok((title, content))
}

fn ensure_author(caller: &UserRow, post: &PostRow) -> Result<(), ApiError> {
    if post.author_id != caller.id {
        warn!(user_id = caller.id, post_id = post.id, "Refusing to change another user's post");
        return Err(ApiError::forbidden("you can only change your own posts"));
    }
    Ok(())
}

fn newest_first(mut posts: Vec<PostRow>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    posts.into_iter().map(Post::from).collect()
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(req): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (title, content) = validate(&req)?;
    let mut post = PostRow {
        id: 0,
        title,
        content,
        author_id: caller.id,
        author_nick: caller.nick,
        likes: 0,
        created_at: state.sessions.now(),
    };
    state.db.put_post(&mut post)?;
    info!(user_id = caller.id, post_id = post.id, "Post created");
    Ok((StatusCode::CREATED, Json(Post::from(post))))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(load_post(&state.db, id)?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<PostRequest>,
) -> Result<Json<Post>, ApiError> {
    let mut post = load_post(&state.db, id)?;
    ensure_author(&caller, &post)?;
    let (title, content) = validate(&req)?;

    post.title = title;
    post.content = content;
    state.db.put_post(&mut post)?;
    Ok(Json(post.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let post = load_post(&state.db, id)?;
    ensure_author(&caller, &post)?;
    state.db.delete_post(id)?;
    info!(user_id = caller.id, post_id = id, "Post deleted");
    Ok(Json(MessageResponse::new("post deleted")))
}

/// The caller's posts plus posts by everyone they follow, newest first.
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Post>>, ApiError> {
    let mut authors = state.db.followed_by(caller.id)?;
    authors.push(caller.id);

    let mut posts = Vec::new();
    for author_id in authors {
        let ids = state.db.filter_posts(&PostFilter {
            author_id: Some(author_id),
            ..Default::default()
        })?;
        posts.extend(state.db.get_posts(&ids)?);
    }
    Ok(Json(newest_first(posts)))
}

pub async fn by_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Post>>, ApiError> {
    load_user(&state.db, id)?;
    let ids = state.db.filter_posts(&PostFilter {
        author_id: Some(id),
        ..Default::default()
    })?;
    Ok(Json(newest_first(state.db.get_posts(&ids)?)))
}

/// +1 on the like counter. Not atomic: concurrent likes can be lost.
pub fn like(db: &Database, id: i64) -> Result<PostRow, ApiError> {
    let mut post = load_post(db, id)?;
    post.likes += 1;
    db.put_post(&mut post)?;
    Ok(post)
}

/// -1 on the like counter. A post with no likes is an error and stays at 0.
pub fn unlike(db: &Database, id: i64) -> Result<PostRow, ApiError> {
    let mut post = load_post(db, id)?;
    if post.likes <= 0 {
        return Err(ApiError::bad_request_msg(
            ErrorCode::Generic,
            "post has no likes to remove",
        ));
    }
    post.likes -= 1;
    db.put_post(&mut post)?;
    Ok(post)
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(like(&state.db, id)?.into()))
}

pub async fn unlike_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(unlike(&state.db, id)?.into()))
}
