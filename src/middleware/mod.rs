pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser, TOKEN_COOKIE};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult};
