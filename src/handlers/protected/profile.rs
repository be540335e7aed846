// handlers/protected/profile.rs - the caller's own profile

use axum::extract::{Extension, State};
use serde_json::{json, Value};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::identity::Identity;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::profile::{parse_fields, Profile, ProfileError};

/// GET /api/fetch-user-data
pub async fn fetch_user_data(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Profile> {
    let profile = state
        .repository
        .get_by_email(&identity.email)
        .await
        .map_err(own_profile_error)?;

    Ok(ApiResponse::success(profile))
}

/// PUT /api/update-user-data - merge a partial profile into the caller's record.
pub async fn update_user_data(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<Value> {
    let patch = parse_fields(&body, state.repository.rules())?;
    state
        .repository
        .update_by_email(&identity.email, &patch)
        .await
        .map_err(own_profile_error)?;

    debug!("Profile of {} updated", identity.subject_id);
    Ok(ApiResponse::success(json!({ "message": "User updated successfully" })))
}

/// A verified caller without a stored profile gets a plain 404.
fn own_profile_error(err: ProfileError) -> ApiError {
    match err {
        ProfileError::NotFound(_) => ApiError::not_found("User not found"),
        other => other.into(),
    }
}
