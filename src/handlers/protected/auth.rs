// handlers/protected/auth.rs - GET /api/auth/me

use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - The authenticated account
pub async fn me_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let account = state.accounts.find(user.account_id).await?;
    Ok(ApiResponse::ok(json!({ "user": account })))
}
