use axum::{
    Extension, Form, Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use rede_types::api::{LoginResponse, UpdateUserRequest};

use crate::client::ApiResponse;
use crate::cookies::{self, WebSession};
use crate::error::WebError;
use crate::middleware::{LOGIN_PAGE, require_cookie};
use crate::state::WebState;

const LOGIN_FORM: &str = r#"<!doctype html>
<form method="post" action="/web/login">
  <input name="email" type="email" placeholder="email">
  <input name="password" type="password" placeholder="password">
  <button type="submit">Entrar</button>
</form>
"#;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub email: String,
}

pub fn router(state: WebState) -> Router {
    let public_routes = Router::new()
        .route("/web/login", get(login_page).post(login))
        .route("/web/logout", get(logout))
        .route("/web/usuario/registrar", post(register));

    let session_routes = Router::new()
        .route("/web/home", get(home))
        .route("/web/perfil", get(profile).post(update_profile))
        .route("/web/publicacao", post(create_post))
        .route("/web/publicacoes/{id}/curtir", post(like))
        .route("/web/publicacoes/{id}/descurtir", post(unlike))
        .route("/web/usuario/{id}/seguir", post(follow))
        .route("/web/usuario/{id}/unfollow", post(unfollow))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_cookie));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .with_state(state)
}

fn relay(jar: CookieJar, res: ApiResponse) -> Response {
    (res.status, jar, Json(res.body)).into_response()
}

/// Calls the backend as the logged-in user. A renewed credential is written
/// back into the cookie; a rejected one logs the browser out.
async fn proxy(
    state: &WebState,
    jar: CookieJar,
    session: WebSession,
    method: Method,
    path: &str,
    body: Option<&serde_json::Value>,
) -> Result<Response, WebError> {
    let res = state.api.send(method, path, Some(&session.token), body).await?;

    if res.status == StatusCode::UNAUTHORIZED {
        warn!(user_id = session.id, "Backend rejected session, logging out");
        return Ok((cookies::clear(jar), Redirect::to(LOGIN_PAGE)).into_response());
    }

    let jar = match &res.renewed {
        Some(token) => {
            let renewed = WebSession {
                id: session.id,
                token: token.clone(),
            };
            cookies::save(jar, &state.cookie_key, &renewed)?
        }
        None => jar,
    };
    Ok(relay(jar, res))
}

async fn login_page() -> Html<&'static str> {
    Html(LOGIN_FORM)
}

pub async fn login(
    State(state): State<WebState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let body = json!({ "email": form.email, "password": form.password });
    let res = state
        .api
        .send(Method::POST, "/usuario/login", None, Some(&body))
        .await?;

    if res.status != StatusCode::OK {
        return Ok(relay(jar, res));
    }

    let login: LoginResponse = serde_json::from_value(res.body.clone())
        .map_err(|e| anyhow::anyhow!("unexpected login response: {}", e))?;
    let jar = cookies::save(
        jar,
        &state.cookie_key,
        &WebSession {
            id: login.id,
            token: login.token,
        },
    )?;
    info!(user_id = login.id, "Web login");
    Ok(relay(jar, res))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (cookies::clear(jar), Redirect::to(LOGIN_PAGE))
}

pub async fn register(
    State(state): State<WebState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, WebError> {
    let body = json!({
        "name": form.name,
        "nick": form.nick,
        "email": form.email,
        "password": form.password,
    });
    let res = state
        .api
        .send(Method::POST, "/usuario/registrar", None, Some(&body))
        .await?;
    Ok(relay(jar, res))
}

pub async fn home(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
) -> Result<Response, WebError> {
    proxy(&state, jar, session, Method::GET, "/publicacoes", None).await
}

pub async fn profile(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
) -> Result<Response, WebError> {
    let path = format!("/usuario/{}", session.id);
    proxy(&state, jar, session, Method::GET, &path, None).await
}

pub async fn update_profile(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, WebError> {
    let set = |v: String| Some(v).filter(|v| !v.trim().is_empty());
    let req = UpdateUserRequest {
        name: set(form.name),
        nick: set(form.nick),
        email: set(form.email),
    };
    let body = serde_json::to_value(&req).map_err(anyhow::Error::from)?;
    let path = format!("/usuario/{}", session.id);
    proxy(&state, jar, session, Method::PUT, &path, Some(&body)).await
}

pub async fn create_post(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
    Form(form): Form<PostForm>,
) -> Result<Response, WebError> {
    let body = json!({ "title": form.title, "content": form.content });
    proxy(&state, jar, session, Method::POST, "/publicacao", Some(&body)).await
}

pub async fn like(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let path = format!("/publicacoes/{}/curtir", id);
    proxy(&state, jar, session, Method::POST, &path, None).await
}

pub async fn unlike(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let path = format!("/publicacoes/{}/descurtir", id);
    proxy(&state, jar, session, Method::POST, &path, None).await
}

pub async fn follow(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let path = format!("/usuario/{}/seguir", id);
    proxy(&state, jar, session, Method::PUT, &path, None).await
}

pub async fn unfollow(
    State(state): State<WebState>,
    jar: CookieJar,
    Extension(session): Extension<WebSession>,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let path = format!("/usuario/{}/unfollow", id);
    proxy(&state, jar, session, Method::PUT, &path, None).await
}
