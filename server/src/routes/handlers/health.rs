use axum::Json;
use serde::Serialize;

use crate::server_config::gemini_api_key;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    gemini_key_loaded: bool,
}

/// Liveness probe, independent of the classification core.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        gemini_key_loaded: gemini_api_key().is_some(),
    })
}
