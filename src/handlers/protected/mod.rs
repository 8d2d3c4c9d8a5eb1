// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here receives the caller's AuthUser through request extensions
// and scopes its work to that account.

pub mod auth;  // Current account
pub mod leads; // Owner-scoped lead CRUD and listing

pub use auth::me_get;
pub use leads::{lead_delete, lead_get, lead_put, leads_get, leads_post};
