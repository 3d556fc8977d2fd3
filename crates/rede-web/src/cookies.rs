use anyhow::Context;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use serde::{Deserialize, Serialize};
use tracing::warn;

use rede_crypto::encrypt::{open, seal};

pub const COOKIE_NAME: &str = "dados";

/// What the browser carries between requests: who is logged in and the
/// backend credential to present on their behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSession {
    pub id: i64,
    pub token: String,
}

/// Encrypts `session` into the session cookie.
pub fn save(jar: CookieJar, key: &[u8; 32], session: &WebSession) -> anyhow::Result<CookieJar> {
    let plaintext = serde_json::to_vec(session).context("encode session cookie")?;
    let sealed = seal(key, &plaintext)?;

    let cookie = Cookie::build((COOKIE_NAME, B64.encode(sealed)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

/// Decrypts the session cookie. Missing, tampered or foreign cookies read
/// as no session.
pub fn read(jar: &CookieJar, key: &[u8; 32]) -> Option<WebSession> {
    let cookie = jar.get(COOKIE_NAME)?;
    let decoded = (|| {
        let sealed = B64.decode(cookie.value())?;
        let plaintext = open(key, &sealed)?;
        anyhow::Ok(serde_json::from_slice::<WebSession>(&plaintext)?)
    })();

    match decoded {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("Discarding unreadable session cookie: {}", e);
            None
        }
    }
}

pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(COOKIE_NAME).path("/"))
}
