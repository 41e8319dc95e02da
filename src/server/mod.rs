//! HTTP surface under `/api/ai-capabilities`

pub mod auth;
mod handlers;


use anyhow::{anyhow, Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analysis::AnalysisService;
use crate::config::Config;
use crate::llm;
use crate::store::HistoryStore;

pub use auth::{AuthUser, TokenKeys};

pub const API_PREFIX: &str = "/api/ai-capabilities";

/// Shared handler state; everything inside is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(service: AnalysisService, keys: TokenKeys) -> Self {
        Self {
            service: Arc::new(service),
            keys: Arc::new(keys),
        }
    }

    /// Open the store, pick the LLM client, and load the signing secret.
    pub fn from_config(config: &Config) -> Result<Self> {
        let secret = config.jwt_secret().ok_or_else(|| {
            anyhow!("JWT secret is not configured; set JWT_SECRET or auth.jwt_secret")
        })?;
        if config.llm_api_key().is_none() {
            tracing::warn!(
                "{} is not set; analysis requests will fail",
                config.llm.api_key_env
            );
        }

        let store = Arc::new(HistoryStore::open(&config.database_path())?);
        let llm = llm::client_from_config(config)?;
        let service = AnalysisService::new(llm, store, config);
        Ok(Self::new(service, TokenKeys::new(&secret)))
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/analyze/code", post(handlers::analyze_code))
        .route("/analyze/security", post(handlers::analyze_security))
        .route("/analyze/performance", post(handlers::analyze_performance))
        .route("/debug/error", post(handlers::debug_error))
        .route("/debug/analyze", post(handlers::analyze_error))
        .route("/debug/sessions", get(handlers::list_debug_sessions))
        .route("/debug/sessions/{id}", get(handlers::get_debug_session))
        .route("/analyses", get(handlers::list_analyses))
        .route("/analyses/stats", get(handlers::analysis_stats))
        .route("/analyses/{id}", get(handlers::get_analysis))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
