// handlers/public/health.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service banner with the configured browser origins
pub async fn root_get(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Backend running!",
        "allowedOrigins": state.config.security.cors_origins,
    }))
}

/// GET /health - Liveness plus a store round-trip; 503 when the store is down
pub async fn health_get(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339();

    match state.leads.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "OK", "timestamp": timestamp, "database": "connected" })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "ERROR", "timestamp": timestamp, "database": "unavailable" })),
            )
        }
    }
}
