use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid filter for '{field}': {message}")]
    InvalidFilter { field: String, message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}

impl FilterError {
    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        FilterError::InvalidFilter { field: field.into(), message: message.into() }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        FilterError::InvalidValue { field: field.into(), message: message.into() }
    }

    /// Request field the error refers to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            FilterError::InvalidFilter { field, .. } | FilterError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}
