// handlers/public/users.rs - profile creation and the ranked listing

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::profile::{parse_fields, RankedPage};

const INVALID_PAGE_SIZE: &str = "Invalid pageSize. It must be a positive number.";

/// POST /api/create-user - store a new profile, answer `201 {"userId": ...}`.
pub async fn create_user(State(state): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult<Value> {
    let fields = parse_fields(&body, state.repository.rules())?;
    let user_id = state.repository.create(fields).await?;

    Ok(ApiResponse::created(json!({ "userId": user_id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedUserQuery {
    pub last_visible_id: Option<String>,
    /// Kept as text so a bad value gets the same message as zero.
    pub page_size: Option<String>,
}

/// GET /api/grouped-user?pageSize=N[&lastVisibleId=ID] - one page of the ranking.
pub async fn grouped_user(
    State(state): State<AppState>,
    query: Result<Query<GroupedUserQuery>, QueryRejection>,
) -> ApiResult<RankedPage> {
    let Query(query) = query?;

    let page_size = parse_page_size(query.page_size.as_deref())?;
    let cursor = query.last_visible_id.as_deref().filter(|id| !id.is_empty());

    let page = state.repository.list_ranked(cursor, page_size).await?;
    Ok(ApiResponse::success(page))
}

fn parse_page_size(raw: Option<&str>) -> Result<u32, ApiError> {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|size| *size > 0)
        .ok_or_else(|| ApiError::bad_request(INVALID_PAGE_SIZE))
}
