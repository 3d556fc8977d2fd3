use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, FixedOffset, Local, TimeDelta, TimeZone, Utc};
use http_body_util::BodyExt;
use mockable::Clock;
use tower::ServiceExt;

use rede_db::Database;
use rede_db::models::UserRow;

use crate::password::hash_password;
use crate::session::{SIGNING_KEY_CONFIG, SessionManager};
use crate::state::{AppState, AppStateInner};

pub const SIGNING_KEY: &str = "test-signing-key";
pub const PASSWORD: &str = "s3cret-pass";

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.0.lock().unwrap() += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn seeded_db() -> Arc<Database> {
    let db = Database::open_in_memory().unwrap();
    db.put_config(SIGNING_KEY_CONFIG, SIGNING_KEY).unwrap();
    Arc::new(db)
}

/// Inserts an active user with [`PASSWORD`] and `<nick>@example.com`.
pub fn signed_user(db: &Database, nick: &str) -> UserRow {
    let mut user = UserRow {
        id: 0,
        name: nick.to_uppercase(),
        nick: nick.to_string(),
        email: format!("{}@example.com", nick),
        password: hash_password(PASSWORD).unwrap(),
        inactive: false,
        created_at: at(2024, 1, 1, 12, 0, 0),
    };
    db.put_user(&mut user).unwrap();
    user
}

pub fn app_state(clock: Arc<MutableClock>) -> AppState {
    let db = seeded_db();
    let sessions = SessionManager::new(db.clone(), clock, FixedOffset::west_opt(3 * 3600).unwrap());
    Arc::new(AppStateInner { db, sessions })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl TestResponse {
    pub fn authorization(&self) -> Option<String> {
        self.headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse { status, headers, body }
}

pub fn json_request(
    method: &str,
    uri: &str,
    credential: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(credential) = credential {
        builder = builder.header(header::AUTHORIZATION, credential);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
