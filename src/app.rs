use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::JwtKeys;
use crate::config::{AppConfig, DatabaseBackend, DatabaseConfig};
use crate::database::{AccountStore, DatabaseError, DatabaseManager, LeadStore, MemoryStore, PgStore};
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, rate_limit_middleware, RateLimiter};
use crate::services::{AccountService, LeadService};

/// The configured persistence backend, shared by the server and the CLI
#[derive(Clone)]
pub struct Stores {
    pub leads: Arc<dyn LeadStore>,
    pub accounts: Arc<dyn AccountStore>,
    pool: Option<PgPool>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self { leads: store.clone(), accounts: store, pool: None }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self { leads: store.clone(), accounts: store, pool: Some(pool) }
    }

    pub fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.backend {
            DatabaseBackend::Memory => {
                info!("Using in-memory store; data is lost on exit");
                Ok(Self::memory())
            }
            DatabaseBackend::Postgres => Ok(Self::postgres(DatabaseManager::connect(config)?)),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.pool.is_some()
    }

    /// Apply the PostgreSQL schema; nothing to do for the memory backend
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match &self.pool {
            Some(pool) => DatabaseManager::migrate(pool).await,
            None => Ok(()),
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub leads: LeadService,
    pub accounts: AccountService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(stores: &Stores, config: AppConfig) -> Self {
        let keys = JwtKeys::from_config(&config.security);
        Self {
            leads: LeadService::new(stores.leads.clone()),
            accounts: AccountService::new(stores.accounts.clone(), keys),
            config: Arc::new(config),
        }
    }
}

/// Build the full router: public and protected routes plus the global layers
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.api.enable_rate_limiting {
        let limiter = Arc::new(RateLimiter::from_config(&config.api));
        router = router.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }
    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/api/auth/register", post(public::register_post))
        .route("/api/auth/login", post(public::login_post))
        .route("/api/auth/logout", post(public::logout_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(protected::me_get))
        .route("/api/leads", get(protected::leads_get).post(protected::leads_post))
        .route(
            "/api/leads/:id",
            get(protected::lead_get)
                .put(protected::lead_put)
                .delete(protected::lead_delete),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Credentialed CORS for the configured browser origins. `*` mirrors the
/// request origin, since credentials rule out a literal wildcard.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
