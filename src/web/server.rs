//! HTTP server wiring.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::{AgentFactory, McpAgentFactory};
use crate::config::AppConfig;
use crate::error::AgentError;
use crate::session::SessionController;

use super::routes;

/// Shared application state.
pub struct AppState {
    pub controller: SessionController,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, factory: Arc<dyn AgentFactory>) -> Self {
        let controller = SessionController::new(
            factory,
            config.agent.connect_timeout(),
            config.agent.turn_timeout(),
        );
        Self { controller, config }
    }

    /// State backed by the real MCP + OpenAI factory.
    pub fn production(config: AppConfig) -> Self {
        let factory = Arc::new(McpAgentFactory::new(&config));
        Self::new(config, factory)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/api/sessions", post(routes::create_session))
        .route(
            "/api/sessions/:id",
            get(routes::get_session).delete(routes::end_session),
        )
        .route("/api/sessions/:id/config", post(routes::commit_config))
        .route("/api/sessions/:id/connect", post(routes::connect))
        .route("/api/sessions/:id/turns", post(routes::submit_turn))
        .route("/api/sessions/:id/reset", post(routes::reset))
        .route("/api/sessions/:id/transcript", delete(routes::clear_transcript))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Periodically end sessions that have been idle for too long.
pub fn spawn_idle_sweeper(state: Arc<AppState>, cancel: CancellationToken) {
    let ttl = Duration::from_secs(state.config.sessions.idle_ttl_secs);
    let every = Duration::from_secs(state.config.sessions.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    state.controller.sweep_idle(ttl).await;
                }
            }
        }
    });
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_listener(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AgentError> {
    let cancel = CancellationToken::new();
    spawn_idle_sweeper(Arc::clone(&state), cancel.clone());

    info!(addr = %listener.local_addr()?, "HTTP server listening");
    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    cancel.cancel();
    result?;
    Ok(())
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn run(
    config: AppConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AgentError> {
    config.validate()?;
    let listener =
        TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let state = Arc::new(AppState::production(config));
    serve_with_listener(listener, state, shutdown).await
}
