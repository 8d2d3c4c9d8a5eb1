use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{Claims, JwtKeys};
use crate::database::models::Account;
use crate::database::AccountStore;
use crate::services::error::{ServiceError, DUPLICATE_ACCOUNT};
use crate::services::validation::normalize_email;

const MIN_PASSWORD_LEN: usize = 6;
const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// An account together with a freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: Account,
    pub token: String,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    keys: JwtKeys,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<Session, ServiceError> {
        let mut field_errors = HashMap::new();
        let email = normalize_email(&request.email);
        if email.is_none() {
            field_errors.insert("email".to_string(), "Invalid email address".to_string());
        }
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            field_errors.insert(
                "password".to_string(),
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        let first_name = request.first_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();
        if first_name.is_empty() {
            field_errors.insert("firstName".to_string(), "firstName is required".to_string());
        }
        if last_name.is_empty() {
            field_errors.insert("lastName".to_string(), "lastName is required".to_string());
        }
        let Some(email) = email.filter(|_| field_errors.is_empty()) else {
            return Err(ServiceError::validation("Validation failed", field_errors));
        };

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(DUPLICATE_ACCOUNT.to_string()));
        }

        let now = Utc::now();
        let account = self
            .store
            .insert(&Account {
                id: Uuid::new_v4(),
                email,
                password_hash: hash_password(&request.password),
                first_name,
                last_name,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(account_id = %account.id, "Registered account");
        self.session(account)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, ServiceError> {
        let unauthorized = || ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string());
        let email = normalize_email(&request.email).ok_or_else(unauthorized)?;

        let account = self.store.find_by_email(&email).await?.ok_or_else(unauthorized)?;
        if !verify_password(&request.password, &account.password_hash) {
            warn!(account_id = %account.id, "Failed login attempt");
            return Err(unauthorized());
        }

        info!(account_id = %account.id, "Account logged in");
        self.session(account)
    }

    pub async fn find(&self, id: Uuid) -> Result<Account, ServiceError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    /// Verify a token and confirm its account still exists
    pub async fn authenticate(&self, token: &str) -> Result<Account, ServiceError> {
        let claims: Claims = self.keys.validate(token)?;
        self.store
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("User not found".to_string()))
    }

    fn session(&self, account: Account) -> Result<Session, ServiceError> {
        let token = self.keys.generate(&self.keys.claims_for(account.id, &account.email))?;
        Ok(Session { user: account, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()), JwtKeys::new(Some("test".into()), 1))
    }

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "test123".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service();
        let session = service.register(register("Test@Example.com")).await.unwrap();
        assert_eq!(session.user.email, "test@example.com");

        let login = service
            .login(LoginRequest { email: "test@example.com".into(), password: "test123".into() })
            .await
            .unwrap();
        assert_eq!(login.user.id, session.user.id);

        let account = service.authenticate(&login.token).await.unwrap();
        assert_eq!(account.id, session.user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let service = service();
        service.register(register("a@b.com")).await.unwrap();
        assert!(matches!(service.register(register("A@B.com")).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let service = service();
        service.register(register("a@b.com")).await.unwrap();
        let wrong = service.login(LoginRequest { email: "a@b.com".into(), password: "nope".into() }).await;
        let unknown = service.login(LoginRequest { email: "z@b.com".into(), password: "test123".into() }).await;
        assert!(matches!(wrong, Err(ServiceError::Unauthorized(_))));
        assert!(matches!(unknown, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let service = service();
        let result = service
            .register(RegisterRequest { email: "bad".into(), password: "123".into(), first_name: "".into(), last_name: "X".into() })
            .await;
        let Err(ServiceError::Validation { field_errors, .. }) = result else {
            panic!("expected validation error");
        };
        assert!(field_errors.contains_key("email"));
        assert!(field_errors.contains_key("password"));
        assert!(field_errors.contains_key("firstName"));
        assert!(!field_errors.contains_key("lastName"));
    }

    #[tokio::test]
    async fn token_for_deleted_account_is_rejected() {
        let service = service();
        let keys = service.keys().clone();
        let token = keys.generate(&keys.claims_for(Uuid::new_v4(), "ghost@x.com")).unwrap();
        assert!(matches!(service.authenticate(&token).await, Err(ServiceError::Unauthorized(_))));
        assert!(matches!(service.authenticate("garbage").await, Err(ServiceError::Unauthorized(_))));
    }
}
