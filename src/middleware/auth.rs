use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Account;
use crate::error::ApiError;

/// Name of the session cookie set on login and register
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated account context extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub account_id: Uuid,
    pub email: String,
}

impl From<&Account> for AuthUser {
    fn from(account: &Account) -> Self {
        Self { account_id: account.id, email: account.email.clone() }
    }
}

/// JWT authentication middleware that validates tokens and injects the account context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&jar, &headers).map_err(ApiError::unauthorized)?;

    // Verifies signature and expiry, then confirms the account still exists
    let account = state.accounts.authenticate(&token).await?;

    request.extensions_mut().insert(AuthUser::from(&account));
    Ok(next.run(request).await)
}

/// Cookie first, then `Authorization: Bearer`
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Result<String, &'static str> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().trim().is_empty() {
            return Ok(cookie.value().to_string());
        }
    }

    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Err("Access token required");
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Access token required"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
