use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::token_route::TokenRouteState;
use crate::token::TokenHandle;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub token_state: TokenRouteState,
}

impl AppState {
    pub fn new(metrics: &Metrics, handle: Arc<TokenHandle>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            token_state: TokenRouteState::new(handle),
        }
    }
}

pub async fn router(settings_config: &SettingsConfig, handle: Arc<TokenHandle>) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, handle);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.token_state.router())
        .with_state(state)
}

/// Serve `/token` and, when enabled, the metrics route until `shutdown` resolves.
/// Does nothing when no server block is configured.
pub async fn start<F>(
    settings_config: &SettingsConfig,
    handle: Arc<TokenHandle>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let Some(server) = &settings_config.server else {
        info!("no server configured, http endpoints disabled");
        shutdown.await;
        return Ok(());
    };

    let app = router(settings_config, handle).await;
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", server.host, server.port)).await?;
    info!("listening on {}", listener.local_addr()?);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    metrics.up.set(0);

    Ok(())
}
