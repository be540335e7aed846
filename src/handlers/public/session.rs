// handlers/public/session.rs - POST /api/verify-user

use axum::extract::State;
use serde_json::{json, Value};
use tracing::debug;

use crate::app::AppState;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};

/// POST /api/verify-user - report whether `tokenId` is a valid identity token.
///
/// Verifier failures are an answer, not an error: the response is
/// `201 {"isLoggedIn": false}`. A missing or non-string `tokenId` is treated
/// the same way.
pub async fn verify_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Value> {
    let token = body
        .get("tokenId")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty());

    let is_logged_in = match token {
        Some(token) => match state.verifier.verify(token).await {
            Ok(identity) => {
                debug!("Verified session for {}", identity.subject_id);
                true
            }
            Err(e) => {
                debug!("Session verification failed: {}", e);
                false
            }
        },
        None => false,
    };

    Ok(ApiResponse::created(json!({ "isLoggedIn": is_logged_in })))
}
