//! Liveness and default parameter binding routes.

use crate::server::AppContext;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use mvgraph_compiler::ParameterBindings;

pub fn params_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/server_status", get(server_status))
        .route("/params", get(get_params).post(replace_params))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn server_status(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "backend": ctx.config.engine.backend.to_string(),
        "state": ctx.session.state(),
    }))
}

async fn get_params(State(ctx): State<AppContext>) -> Json<ParameterBindings> {
    Json(ctx.params.read().clone())
}

/// Replace the default bindings used by later loads.
async fn replace_params(
    State(ctx): State<AppContext>,
    Json(params): Json<ParameterBindings>,
) -> Json<ParameterBindings> {
    tracing::info!("Replacing {} default parameter bindings", params.len());
    *ctx.params.write() = params.clone();
    Json(params)
}
