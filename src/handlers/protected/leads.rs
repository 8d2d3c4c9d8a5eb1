// handlers/protected/leads.rs - /api/leads and /api/leads/:id

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, RawQuery, State},
    response::Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::database::models::Lead;
use crate::error::ApiError;
use crate::filter::{decode_query, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/leads - Filtered, paginated listing
///
/// Filters use bracket notation (`status[operator]=in&status[value]=new,won`)
/// or a JSON literal per field; `page` and `limit` select the slice.
pub async fn leads_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    RawQuery(query): RawQuery,
) -> ApiResult<Page<Lead>> {
    let params = decode_query(query.as_deref().unwrap_or(""));
    let page = state.leads.list(user.account_id, &params).await?;
    Ok(ApiResponse::ok(page))
}

/// GET /api/leads/:id
pub async fn lead_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Lead> {
    let lead = state.leads.get(user.account_id, &id).await?;
    Ok(ApiResponse::ok(lead))
}

/// POST /api/leads - 201 with the stored lead
pub async fn leads_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Lead> {
    let Json(body) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let lead = state.leads.create(user.account_id, &body).await?;
    Ok(ApiResponse::created(lead))
}

/// PUT /api/leads/:id - Partial update; omitted fields keep their values
pub async fn lead_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Lead> {
    let Json(body) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let lead = state.leads.update(user.account_id, &id, &body).await?;
    Ok(ApiResponse::ok(lead))
}

/// DELETE /api/leads/:id - 204
pub async fn lead_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.leads.delete(user.account_id, &id).await?;
    Ok(ApiResponse::no_content())
}
