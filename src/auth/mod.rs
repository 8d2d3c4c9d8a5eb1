pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// HS256 signing and verification for session tokens
#[derive(Clone)]
pub struct JwtKeys {
    secret: Option<String>,
    expiry_hours: u64,
}

impl JwtKeys {
    pub fn new(secret: Option<String>, expiry_hours: u64) -> Self {
        Self { secret: secret.filter(|s| !s.is_empty()), expiry_hours }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    pub fn expiry_hours(&self) -> u64 {
        self.expiry_hours
    }

    fn secret(&self) -> Result<&[u8], JwtError> {
        self.secret.as_deref().map(str::as_bytes).ok_or(JwtError::MissingSecret)
    }

    pub fn claims_for(&self, account_id: Uuid, email: &str) -> Claims {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.expiry_hours as i64)).timestamp();
        Claims { sub: account_id, email: email.to_string(), exp, iat: now.timestamp() }
    }

    pub fn generate(&self, claims: &Claims) -> Result<String, JwtError> {
        let encoding_key = EncodingKey::from_secret(self.secret()?);
        encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let decoding_key = DecodingKey::from_secret(self.secret()?);
        decode::<Claims>(token, &decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }
}
