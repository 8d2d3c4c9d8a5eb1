pub mod account_service;
pub mod error;
pub mod lead_service;
pub mod seed;
pub mod validation;

pub use account_service::{AccountService, LoginRequest, RegisterRequest, Session};
pub use error::ServiceError;
pub use lead_service::LeadService;
