use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::config::issuer::EditorSettings;
use crate::config::settings::SettingsConfig;
use crate::grant::issuer::GrantIssuer;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::grant_routes::GrantState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub grant_state: GrantState,
}

impl AppState {
    pub fn new(metrics: &Metrics, issuer: Arc<GrantIssuer>, editor: &EditorSettings) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            grant_state: GrantState::new(issuer, editor.clone()),
        }
    }
}

/// Assemble grant, health and (when enabled) metrics routes.
pub async fn build_router(
    settings_config: &SettingsConfig,
    issuer: Arc<GrantIssuer>,
    editor: &EditorSettings,
) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, issuer, editor);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.grant_state.router())
        .with_state(state)
}

/// Start the single HTTP server and serve until `shutdown` resolves.
pub async fn start<F>(
    settings_config: &SettingsConfig,
    issuer: Arc<GrantIssuer>,
    editor: &EditorSettings,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(settings_config, issuer, editor).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")?;
    metrics.up.set(0);

    info!("http server stopped");
    Ok(())
}
