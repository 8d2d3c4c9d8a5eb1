use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Account, Lead};
use crate::database::query_builder::QueryBuilder;
use crate::database::store::{AccountStore, LeadStore};
use crate::filter::types::{FilterOrderInfo, Predicate};

const LEADS_TABLE: &str = "leads";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LeadStore for PgStore {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: &[FilterOrderInfo],
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Lead>, DatabaseError> {
        QueryBuilder::<Lead>::new(LEADS_TABLE)?
            .where_clause(predicate.clone())
            .order(sort.to_vec())
            .limit(limit, Some(skip))?
            .select_all(&self.pool)
            .await
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64, DatabaseError> {
        QueryBuilder::<Lead>::new(LEADS_TABLE)?
            .where_clause(predicate.clone())
            .count(&self.pool)
            .await
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Lead>, DatabaseError> {
        QueryBuilder::<Lead>::new(LEADS_TABLE)?
            .where_clause(predicate.clone())
            .limit(1, None)?
            .select_optional(&self.pool)
            .await
    }

    async fn insert(&self, lead: &Lead) -> Result<Lead, DatabaseError> {
        let row = sqlx::query_as::<_, Lead>(
            r#"INSERT INTO "leads" (
                "id", "owner_id", "first_name", "last_name", "email", "phone", "company", "city", "state",
                "source", "status", "score", "lead_value", "last_activity_at", "is_qualified",
                "created_at", "updated_at"
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *"#,
        )
        .bind(lead.id)
        .bind(lead.owner_id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(lead.score)
        .bind(lead.lead_value)
        .bind(lead.last_activity_at)
        .bind(lead.is_qualified)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .fetch_one(&self.pool)
        .await?;

        debug!(lead_id = %row.id, owner_id = %row.owner_id, "Inserted lead");
        Ok(row)
    }

    async fn update_by_id(&self, owner: Uuid, id: Uuid, lead: &Lead) -> Result<Option<Lead>, DatabaseError> {
        let row = sqlx::query_as::<_, Lead>(
            r#"UPDATE "leads" SET
                "first_name" = $3, "last_name" = $4, "email" = $5, "phone" = $6, "company" = $7,
                "city" = $8, "state" = $9, "source" = $10, "status" = $11, "score" = $12,
                "lead_value" = $13, "last_activity_at" = $14, "is_qualified" = $15, "updated_at" = $16
            WHERE "owner_id" = $1 AND "id" = $2
            RETURNING *"#,
        )
        .bind(owner)
        .bind(id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.source.as_str())
        .bind(lead.status.as_str())
        .bind(lead.score)
        .bind(lead.lead_value)
        .bind(lead.last_activity_at)
        .bind(lead.is_qualified)
        .bind(lead.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(r#"DELETE FROM "leads" WHERE "owner_id" = $1 AND "id" = $2"#)
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(r#"SELECT * FROM "accounts" WHERE "id" = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(r#"SELECT * FROM "accounts" WHERE "email" = $1"#)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn insert(&self, account: &Account) -> Result<Account, DatabaseError> {
        let row = sqlx::query_as::<_, Account>(
            r#"INSERT INTO "accounts" ("id", "email", "password_hash", "first_name", "last_name", "created_at", "updated_at")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *"#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
