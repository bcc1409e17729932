//! HTTP gateway (Axum) for the PR intelligence pipeline.
//!
//! This module is primarily used by the `diffscope` server binary.

pub mod error;
pub mod handler;
pub mod state;
pub mod webhook;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use handler::{cluster_handler, rank_handler, retrieve_handler};
pub use state::HandlerState;
pub use webhook::webhook_handler;

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/rank", post(rank_handler))
        .route("/cluster", post(cluster_handler))
        .route("/retrieve", post(retrieve_handler))
        .route("/webhooks/github", post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
