use std::collections::HashMap;

use thiserror::Error;

use crate::auth::JwtError;
use crate::database::schema::{ACCOUNTS_EMAIL_KEY, LEADS_OWNER_EMAIL_KEY};
use crate::database::DatabaseError;
use crate::filter::FilterError;

/// Domain errors raised by the lead and account services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { message: String, field_errors: HashMap<String, String> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(DatabaseError),

    #[error("{0}")]
    Internal(String),
}

pub const DUPLICATE_LEAD: &str = "Lead with this email already exists";
pub const DUPLICATE_ACCOUNT: &str = "User with this email already exists";

impl ServiceError {
    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ServiceError::Validation { message: message.into(), field_errors }
    }

    pub fn field(field: impl Into<String>, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), problem.into());
        ServiceError::validation("Validation failed", field_errors)
    }
}

impl From<FilterError> for ServiceError {
    fn from(err: FilterError) -> Self {
        match err.field() {
            Some(field) => ServiceError::field(field, err.to_string()),
            None => ServiceError::validation(err.to_string(), HashMap::new()),
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation(ref constraint) if constraint == LEADS_OWNER_EMAIL_KEY => {
                ServiceError::Conflict(DUPLICATE_LEAD.to_string())
            }
            DatabaseError::UniqueViolation(ref constraint) if constraint == ACCOUNTS_EMAIL_KEY => {
                ServiceError::Conflict(DUPLICATE_ACCOUNT.to_string())
            }
            DatabaseError::UniqueViolation(constraint) => {
                ServiceError::Conflict(format!("Duplicate value violates {}", constraint))
            }
            DatabaseError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Store(other),
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::Invalid(_) => ServiceError::Unauthorized("Invalid or expired token".to_string()),
            JwtError::MissingSecret | JwtError::TokenGeneration(_) => ServiceError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violations_become_conflicts() {
        let lead = ServiceError::from(DatabaseError::UniqueViolation(LEADS_OWNER_EMAIL_KEY.into()));
        assert!(matches!(lead, ServiceError::Conflict(ref m) if m == DUPLICATE_LEAD));
        let account = ServiceError::from(DatabaseError::UniqueViolation(ACCOUNTS_EMAIL_KEY.into()));
        assert!(matches!(account, ServiceError::Conflict(ref m) if m == DUPLICATE_ACCOUNT));
    }

    #[test]
    fn filter_errors_carry_the_field() {
        let err = ServiceError::from(FilterError::invalid_value("score", "expected an integer"));
        let ServiceError::Validation { field_errors, .. } = err else {
            panic!("expected validation error");
        };
        assert!(field_errors.contains_key("score"));
    }

    #[test]
    fn other_store_errors_stay_opaque() {
        let err = ServiceError::from(DatabaseError::Unavailable("down".into()));
        assert!(matches!(err, ServiceError::Store(DatabaseError::Unavailable(_))));
    }
}
