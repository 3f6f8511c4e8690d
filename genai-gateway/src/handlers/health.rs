use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint for liveness probes.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "genai-gateway",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check: the provider must answer its own health check.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.text_provider.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Provider health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
