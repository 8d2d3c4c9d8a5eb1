use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::models::Lead;
use crate::database::LeadStore;
use crate::filter::types::{Condition, LeadColumn, Predicate, SqlParam};
use crate::filter::{FilterOrder, FilterParser, FilterWhere, Page, PageRequest};
use crate::services::error::{ServiceError, DUPLICATE_LEAD};
use crate::services::validation::{LeadChanges, LeadDraft};

const LEAD_NOT_FOUND: &str = "Lead not found";

/// Owner-scoped lead operations
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    /// Filtered, paginated listing. `params` is the decoded query string.
    pub async fn list(&self, owner: Uuid, params: &Value) -> Result<Page<Lead>, ServiceError> {
        let filters = FilterParser::parse(params)?;
        let page = PageRequest::from_params(params);
        let predicate = FilterWhere::compile(&filters, owner);
        let order = FilterOrder::default_order();

        debug!(owner_id = %owner, filters = filters.len(), page = page.page, limit = page.limit, "Listing leads");

        let (total, data) = futures::try_join!(
            self.store.count(&predicate),
            self.store.find(&predicate, &order, page.offset(), page.limit),
        )?;
        Ok(Page::new(data, page, total))
    }

    pub async fn get(&self, owner: Uuid, id: &str) -> Result<Lead, ServiceError> {
        let id = parse_id(id)?;
        self.find_owned(owner, id).await
    }

    pub async fn create(&self, owner: Uuid, body: &Value) -> Result<Lead, ServiceError> {
        let draft = LeadDraft::from_json(body)?;

        // Friendly fast path; the store constraint still decides races
        if self.email_taken(owner, &draft.email, None).await? {
            return Err(ServiceError::Conflict(DUPLICATE_LEAD.to_string()));
        }

        let lead = self.store.insert(&draft.into_lead(owner, Utc::now())).await?;
        info!(lead_id = %lead.id, owner_id = %owner, "Created lead");
        Ok(lead)
    }

    pub async fn update(&self, owner: Uuid, id: &str, body: &Value) -> Result<Lead, ServiceError> {
        let id = parse_id(id)?;
        let changes = LeadChanges::from_json(body)?;
        let mut lead = self.find_owned(owner, id).await?;

        if let Some(email) = changes.email.as_deref() {
            if email != lead.email && self.email_taken(owner, email, Some(id)).await? {
                return Err(ServiceError::Conflict(DUPLICATE_LEAD.to_string()));
            }
        }

        changes.apply(&mut lead);
        lead.updated_at = Utc::now();

        let updated = self
            .store
            .update_by_id(owner, id, &lead)
            .await?
            .ok_or_else(|| ServiceError::NotFound(LEAD_NOT_FOUND.to_string()))?;
        info!(lead_id = %id, owner_id = %owner, "Updated lead");
        Ok(updated)
    }

    pub async fn delete(&self, owner: Uuid, id: &str) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        if !self.store.delete_by_id(owner, id).await? {
            return Err(ServiceError::NotFound(LEAD_NOT_FOUND.to_string()));
        }
        info!(lead_id = %id, owner_id = %owner, "Deleted lead");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(self.store.health_check().await?)
    }

    async fn find_owned(&self, owner: Uuid, id: Uuid) -> Result<Lead, ServiceError> {
        let predicate = Predicate::owned_by(owner).and(Condition::Eq(LeadColumn::Id, SqlParam::Uuid(id)));
        self.store
            .find_one(&predicate)
            .await?
            .ok_or_else(|| ServiceError::NotFound(LEAD_NOT_FOUND.to_string()))
    }

    async fn email_taken(&self, owner: Uuid, email: &str, except: Option<Uuid>) -> Result<bool, ServiceError> {
        let mut predicate =
            Predicate::owned_by(owner).and(Condition::Eq(LeadColumn::Email, SqlParam::Text(email.to_string())));
        if let Some(id) = except {
            predicate.push(Condition::Ne(LeadColumn::Id, SqlParam::Uuid(id)));
        }
        Ok(self.store.find_one(&predicate).await?.is_some())
    }
}

/// An id that is not a UUID cannot name an existing lead
fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::NotFound(LEAD_NOT_FOUND.to_string()))
}
