// handlers/system.rs - service info and health

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Profile API",
        "version": version,
        "description": "Authenticated user-profile REST API",
        "endpoints": {
            "verify": "POST /api/verify-user (public)",
            "create": "POST /api/create-user (public)",
            "ranking": "GET /api/grouped-user?pageSize=N[&lastVisibleId=ID] (public)",
            "profile": "GET /api/fetch-user-data (bearer token)",
            "update": "PUT /api/update-user-data (bearer token)",
            "health": "GET /health (public)",
        }
    }))
}

/// GET /health - 503 when the profile store does not answer
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.repository.backend_tag();

    if let Err(e) = state.repository.health_check().await {
        tracing::error!("Health check failed ({}): {}", store, e);
        return Err(ApiError::service_unavailable("Profile store unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "store": store,
    })))
}
