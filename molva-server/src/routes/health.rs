use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use molva_shared::types::api::HealthResponse;

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(
        "molva-server",
        env!("CARGO_PKG_VERSION"),
        &state.config.backend_url,
        &state.config.frontend_url,
    ))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
