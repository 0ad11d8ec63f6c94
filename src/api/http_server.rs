// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::signboard::detect_signboard_handler;
use crate::config::ServerConfig;
use crate::pipeline::SignboardPipeline;
use crate::version;
use crate::vision::VisionModelManager;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SignboardPipeline>,
    pub models: Arc<VisionModelManager>,
}

impl AppState {
    pub fn new(pipeline: SignboardPipeline, models: VisionModelManager) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            models: Arc::new(models),
        }
    }
}

/// Build the application router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Signboard detection
        .route(
            "/api/detect-signboard",
            post(detect_signboard_handler).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        // Retained originals
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until Ctrl+C
pub async fn start_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let app = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    tracing::info!("🚀 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let models: serde_json::Map<String, serde_json::Value> = state
        .models
        .list_models()
        .into_iter()
        .map(|model| (model.model_type.clone(), json!(model)))
        .collect();

    Json(json!({
        "status": "ok",
        "version": version::VERSION_NUMBER,
        "models": models,
        "asset_store": state.pipeline.store_name(),
    }))
}
