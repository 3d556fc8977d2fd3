use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use rede_web::client::ApiClient;
use rede_web::config::WebConfig;
use rede_web::routes;
use rede_web::state::{WebState, WebStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rede_web=debug,tower_http=debug".into()),
        )
        .init();

    let config = WebConfig::from_env()?;
    info!("Proxying to backend at {}", config.api_url);

    let state: WebState = Arc::new(WebStateInner {
        api: ApiClient::new(config.api_url),
        cookie_key: config.cookie_key,
    });

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Rede web client listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down...");
        })
        .await?;

    Ok(())
}
