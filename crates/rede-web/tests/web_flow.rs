use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::Router;
use chrono::FixedOffset;
use http_body_util::BodyExt;
use tower::ServiceExt;

use rede_api::session::{SIGNING_KEY_CONFIG, SessionManager};
use rede_api::state::AppStateInner;
use rede_db::Database;
use rede_web::client::ApiClient;
use rede_web::state::WebStateInner;

async fn spawn_backend() -> (String, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    db.put_config(SIGNING_KEY_CONFIG, "integration-key").unwrap();
    let sessions = SessionManager::new(
        db.clone(),
        Arc::new(mockable::DefaultClock),
        FixedOffset::west_opt(3 * 3600).unwrap(),
    );
    let app = rede_api::routes::router(Arc::new(AppStateInner {
        db: db.clone(),
        sessions,
    }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{}", addr), db)
}

fn web_app(api_url: String) -> Router {
    rede_web::routes::router(Arc::new(WebStateInner {
        api: ApiClient::new(api_url),
        cookie_key: rede_crypto::keys::generate_key(),
    }))
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    cookie: Option<String>,
    body: serde_json::Value,
}

async fn call(app: &Router, method: &str, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let req = match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let location = res
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    Reply {
        status,
        location,
        cookie,
        body,
    }
}

#[tokio::test]
async fn login_post_and_feed_through_web_client() {
    let (api_url, db) = spawn_backend().await;
    let app = web_app(api_url);

    let res = call(
        &app,
        "POST",
        "/web/usuario/registrar",
        None,
        Some("name=Ana&nick=ana&email=ana%40example.com&password=pw123"),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let user_id = res.body["id"].as_i64().unwrap();

    let res = call(&app, "GET", "/web/home", None, None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/web/login"));

    let res = call(&app, "POST", "/web/login", None, Some("email=ana%40example.com&password=nope")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.cookie.is_none());

    let res = call(&app, "POST", "/web/login", None, Some("email=ana%40example.com&password=pw123")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], user_id);
    let cookie = res.cookie.unwrap();
    assert!(cookie.starts_with("dados="));
    assert!(!cookie.contains("APPTCSS"));

    let res = call(&app, "POST", "/web/publicacao", Some(&cookie), Some("title=oi&content=primeiro+post")).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["content"], "primeiro post");
    // Backend renewed the credential, so the cookie is re-issued.
    let cookie = res.cookie.unwrap();

    let res = call(&app, "GET", "/web/home", Some(&cookie), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    let post_id = res.body[0]["id"].as_i64().unwrap();

    let res = call(&app, "POST", &format!("/web/publicacoes/{post_id}/curtir"), Some(&cookie), Some("")).await;
    assert_eq!(res.body["likes"], 1);

    let res = call(&app, "POST", "/web/perfil", Some(&cookie), Some("name=Ana+Maria")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Ana Maria");
    assert_eq!(res.body["nick"], "ana");

    let res = call(&app, "GET", "/web/logout", Some(&cookie), None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.cookie.as_deref(), Some("dados="));

    // Deactivated on the backend: the web client drops the cookie.
    let mut user = db.get_user(user_id).unwrap().unwrap();
    user.inactive = true;
    db.put_user(&mut user).unwrap();
    let res = call(&app, "GET", "/web/home", Some(&cookie), None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.cookie.as_deref(), Some("dados="));
}

#[tokio::test]
async fn tampered_cookie_redirects_to_login() {
    let (api_url, _db) = spawn_backend().await;
    let app = web_app(api_url);

    let res = call(&app, "GET", "/web/home", Some("dados=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"), None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("/web/login"));

    let res = call(&app, "GET", "/web/login", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
}
