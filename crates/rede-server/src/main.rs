use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::FixedOffset;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use rede_api::routes;
use rede_api::session::{DEFAULT_SESSION_TTL, SESSION_TTL_CONFIG, SIGNING_KEY_CONFIG, SessionManager};
use rede_api::state::{AppState, AppStateInner};
use rede_db::Database;

/// Bytes of randomness in a generated signing key.
const SIGNING_KEY_LEN: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rede=debug,rede_api=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("REDE_DB_PATH").unwrap_or_else(|_| "rede.db".into());
    let host = std::env::var("REDE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("REDE_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()
        .context("REDE_PORT must be a port number")?;
    let offset_minutes: i32 = std::env::var("REDE_UTC_OFFSET_MINUTES")
        .unwrap_or_else(|_| "-180".into())
        .parse()
        .context("REDE_UTC_OFFSET_MINUTES must be an integer")?;
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .context("REDE_UTC_OFFSET_MINUTES is out of range")?;

    // Init database
    let db = Arc::new(Database::open(&PathBuf::from(&db_path))?);
    bootstrap_config(&db)?;

    // Shared state
    let sessions = SessionManager::new(db.clone(), Arc::new(mockable::DefaultClock), offset);
    let state: AppState = Arc::new(AppStateInner { db, sessions });

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Rede server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Rede server stopped");
    Ok(())
}

/// Seeds the config values sessions depend on. Existing values are kept.
fn bootstrap_config(db: &Database) -> anyhow::Result<()> {
    if db.get_config(SIGNING_KEY_CONFIG)?.is_none_or(|k| k.is_empty()) {
        db.put_config(SIGNING_KEY_CONFIG, &rede_crypto::keys::generate_secret(SIGNING_KEY_LEN))?;
        info!("Generated a new session signing key");
    }
    if db.get_config(SESSION_TTL_CONFIG)?.is_none() {
        db.put_config(SESSION_TTL_CONFIG, DEFAULT_SESSION_TTL)?;
        info!("Session TTL set to default {}", DEFAULT_SESSION_TTL);
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_generates_key_once() {
        let db = Database::open_in_memory().unwrap();
        bootstrap_config(&db).unwrap();
        let key = db.get_config(SIGNING_KEY_CONFIG).unwrap().unwrap();
        assert!(key.len() > 80);
        assert_eq!(db.get_config(SESSION_TTL_CONFIG).unwrap().as_deref(), Some("40m"));

        db.put_config(SESSION_TTL_CONFIG, "2h").unwrap();
        bootstrap_config(&db).unwrap();
        assert_eq!(db.get_config(SIGNING_KEY_CONFIG).unwrap().unwrap(), key);
        assert_eq!(db.get_config(SESSION_TTL_CONFIG).unwrap().as_deref(), Some("2h"));
    }
}
