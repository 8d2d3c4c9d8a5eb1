use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Lead};
use crate::filter::types::{FilterOrderInfo, Predicate};

/// Persistence for leads. Every read and write is scoped to an owner.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: &[FilterOrderInfo],
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Lead>, DatabaseError>;

    async fn count(&self, predicate: &Predicate) -> Result<i64, DatabaseError>;

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Lead>, DatabaseError>;

    /// Fails with `UniqueViolation` when the owner already has a lead with this email
    async fn insert(&self, lead: &Lead) -> Result<Lead, DatabaseError>;

    /// Replace the stored lead; `None` when no lead with `id` belongs to `owner`
    async fn update_by_id(&self, owner: Uuid, id: Uuid, lead: &Lead) -> Result<Option<Lead>, DatabaseError>;

    /// `false` when no lead with `id` belongs to `owner`
    async fn delete_by_id(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError>;

    /// Lookup by the normalized (lower-case) email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;

    async fn insert(&self, account: &Account) -> Result<Account, DatabaseError>;
}
