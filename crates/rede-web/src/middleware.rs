use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::cookies;
use crate::state::WebState;

pub const LOGIN_PAGE: &str = "/web/login";

/// Pages behind this need a readable session cookie; anyone else is sent to
/// the login page. The decoded session is passed on as an extension.
pub async fn require_cookie(
    State(state): State<WebState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match cookies::read(&jar, &state.cookie_key) {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => Redirect::to(LOGIN_PAGE).into_response(),
    }
}
