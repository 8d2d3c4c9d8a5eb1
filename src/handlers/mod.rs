// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) -> Protected (JWT auth via jwt_auth_middleware)
pub mod public;    // /, /health, /api/auth/{register,login,logout}
pub mod protected; // /api/auth/me, /api/leads/*

pub use protected::{lead_delete, lead_get, lead_put, leads_get, leads_post, me_get};
pub use public::{health_get, login_post, logout_post, register_post, root_get};
