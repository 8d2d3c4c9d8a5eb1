//! Fixed-window request limiting per client address
//!
//! Each client gets `rate_limit_requests` requests per window. A window opens with
//! the client's first request and resets once `rate_limit_window_secs` have passed.
//! Up to twice the limit can land around a window boundary.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Never counted
const EXEMPT_PATHS: &[&str] = &["/health"];

/// Expired windows are swept once this many clients are tracked
const SWEEP_THRESHOLD: usize = 10_000;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the client's window resets
    pub reset_after: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window, windows: Mutex::new(HashMap::new()) }
    }

    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new(api.rate_limit_requests, Duration::from_secs(api.rate_limit_window_secs.max(1)))
    }

    /// Count a request from `key` and report whether it may proceed
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        // Counters stay consistent across a poisoning panic
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() >= SWEEP_THRESHOLD {
            let span = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < span);
        }

        let window = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(window.started) >= self.window {
            *window = Window { started: now, count: 0 };
        }

        let allowed = window.count < self.limit;
        if allowed {
            window.count += 1;
        }

        let left = self.window.saturating_sub(now.duration_since(window.started));
        RateLimitResult {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(window.count),
            reset_after: left.as_secs() + u64::from(left.subsec_nanos() > 0),
        }
    }
}

/// Rejects clients over their budget with 429. `/health` passes through uncounted.
pub async fn rate_limit_middleware(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    if EXEMPT_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let key = client_key(&request);
    let result = limiter.check(&key);

    if !result.allowed {
        debug!(%key, limit = result.limit, "Rate limit exceeded");
        let mut response =
            ApiError::too_many_requests("Too many requests from this IP, please try again later.").into_response();
        add_rate_limit_headers(&mut response, &result);
        response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(result.reset_after));
        return response;
    }

    let mut response = next.run(request).await;
    add_rate_limit_headers(&mut response, &result);
    response
}

fn add_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    headers.insert(LIMIT_HEADER, HeaderValue::from(result.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(result.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(result.reset_after));
}

/// Peer address when the server recorded one, else the first `X-Forwarded-For` hop
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    #[test]
    fn counts_down_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        let first = limiter.check_at("1.2.3.4", now);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset_after, 60);

        assert!(limiter.check_at("1.2.3.4", now).allowed);
        let blocked = limiter.check_at("1.2.3.4", now + Duration::from_secs(10));
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert_eq!(blocked.reset_after, 50);

        // Other clients keep their own budget
        assert!(limiter.check_at("5.6.7.8", now).allowed);
    }

    #[test]
    fn window_resets_after_its_span() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("a", now).allowed);
        assert!(!limiter.check_at("a", now + Duration::from_secs(59)).allowed);
        assert!(limiter.check_at("a", now + Duration::from_secs(60)).allowed);
    }

    #[test]
    fn zero_window_is_clamped_to_a_second() {
        let mut api = crate::config::AppConfig::from_lookup(|_| None).api;
        api.rate_limit_requests = 3;
        api.rate_limit_window_secs = 0;
        let limiter = RateLimiter::from_config(&api);
        assert_eq!(limiter.window, Duration::from_secs(1));
        assert_eq!(limiter.check("x").limit, 3);
    }

    #[test]
    fn client_key_prefers_peer_address() {
        let mut request = http::Request::builder()
            .uri("/api/leads")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.9");

        let peer: SocketAddr = "192.0.2.7:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_key(&request), "192.0.2.7");

        let bare = http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_key(&bare), "unknown");
    }
}
