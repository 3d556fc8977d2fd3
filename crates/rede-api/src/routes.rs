use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, config, establishments, followers, posts, users};

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Backend route table. Everything except login and registration sits
/// behind [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/usuario/login", post(auth::login))
        .route("/usuario/registrar", post(auth::register));

    let protected_routes = Router::new()
        .route("/usuario", get(users::list))
        .route(
            "/usuario/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/usuario/{id}/senha", post(users::change_password))
        .route("/usuario/{id}/desativar", post(users::deactivate))
        .route("/usuario/{id}/seguir", put(followers::follow_user))
        .route("/usuario/{id}/unfollow", put(followers::unfollow_user))
        .route("/usuario/{id}/seguidores", get(followers::followers))
        .route("/usuario/{id}/seguindo", get(followers::following))
        .route("/usuario/{id}/publicacoes", get(posts::by_author))
        .route("/publicacao", post(posts::create))
        .route(
            "/publicacao/{id}",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route("/publicacoes", get(posts::feed))
        .route("/publicacoes/{id}/curtir", post(posts::like_post))
        .route("/publicacoes/{id}/descurtir", post(posts::unlike_post))
        .route("/config", get(config::get).post(config::put))
        .route(
            "/estabelecimento",
            get(establishments::list).post(establishments::register),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}
