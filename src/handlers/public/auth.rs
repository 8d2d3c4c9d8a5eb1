// handlers/public/auth.rs - POST /api/auth/{register,login,logout}

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, TOKEN_COOKIE};
use crate::services::{LoginRequest, RegisterRequest, Session};

/// POST /api/auth/register - Create an account and start a session
///
/// Input: `{ "email", "password", "firstName", "lastName" }`. Responds 201 with
/// `{ user, token }` and sets the `token` cookie.
pub async fn register_post(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<Session>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let session = state.accounts.register(request).await?;
    let jar = jar.add(session_cookie(&state, session.token.clone()));
    Ok((jar, ApiResponse::created(session)))
}

/// POST /api/auth/login - Exchange credentials for a session token
pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, ApiResponse<Session>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::invalid_json(e.body_text()))?;
    let session = state.accounts.login(request).await?;
    let jar = jar.add(session_cookie(&state, session.token.clone()));
    Ok((jar, ApiResponse::ok(session)))
}

/// POST /api/auth/logout - Clear the session cookie. Tokens are stateless, so
/// a copied bearer token stays valid until it expires.
pub async fn logout_post(jar: CookieJar) -> (CookieJar, Json<Value>) {
    // Added rather than removed: the jar only emits removals for cookies the request carried
    let mut expired = Cookie::build((TOKEN_COOKIE, "")).path("/").http_only(true).build();
    expired.make_removal();
    (jar.add(expired), Json(json!({ "message": "Logged out successfully" })))
}

const MAX_COOKIE_HOURS: u64 = 24 * 365 * 10;

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let secure = state.config.security.secure_cookies;
    let hours = state.accounts.keys().expiry_hours().min(MAX_COOKIE_HOURS) as i64;

    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        // Cross-site browsers only send the cookie with SameSite=None, which needs Secure
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(time::Duration::hours(hours))
        .build()
}
