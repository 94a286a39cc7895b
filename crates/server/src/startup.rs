use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use configs::AppConfig;
use service::{runtime, SessionTokens};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Open the store and assemble the router for a loaded configuration.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let store = runtime::open_store(cfg).await.map_err(|e| StartupError::Store(format!("{e:#}")))?;
    let tokens = SessionTokens::new(cfg.auth.jwt_secret.clone(), cfg.auth.token_ttl_hours);
    let state = ServerState::new(store, tokens, cfg.roster.clone());
    Ok(routes::build_router(state, build_cors()))
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_app(&cfg).await?;
    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, backend = ?cfg.store.backend, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server stopped");
    Ok(())
}
