// handlers/public/mod.rs - Handlers reachable without a session token

pub mod auth;   // Token acquisition and release
pub mod health; // Service banner and liveness

pub use auth::{login_post, logout_post, register_post};
pub use health::{health_get, root_get};
