use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Lead};
use crate::database::schema::{ACCOUNTS_EMAIL_KEY, LEADS_OWNER_EMAIL_KEY};
use crate::database::store::{AccountStore, LeadStore};
use crate::filter::evaluate::compare;
use crate::filter::types::{FilterOrderInfo, Predicate, SortDirection};

/// In-process store with the same constraints as the PostgreSQL schema.
/// Used for development without a database and in tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    leads: Arc<RwLock<HashMap<Uuid, Lead>>>,
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), DatabaseError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(DatabaseError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

/// Row ordering by the sort keys; NULL sorts after every value as in PostgreSQL
fn order_leads(a: &Lead, b: &Lead, sort: &[FilterOrderInfo]) -> Ordering {
    for info in sort {
        let ordering = match (a.value_of(info.column), b.value_of(info.column)) {
            (Some(x), Some(y)) => compare(&x, &y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        let ordering = match info.sort {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn find(
        &self,
        predicate: &Predicate,
        sort: &[FilterOrderInfo],
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Lead>, DatabaseError> {
        self.ensure_online()?;
        let leads = self.leads.read().await;
        let mut matched: Vec<&Lead> = leads.values().filter(|lead| predicate.matches(lead)).collect();
        matched.sort_by(|a, b| order_leads(a, b, sort));

        let skip = usize::try_from(skip).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(matched.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64, DatabaseError> {
        self.ensure_online()?;
        let leads = self.leads.read().await;
        let total = leads.values().filter(|lead| predicate.matches(lead)).count();
        Ok(total as i64)
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Lead>, DatabaseError> {
        self.ensure_online()?;
        let leads = self.leads.read().await;
        Ok(leads.values().find(|lead| predicate.matches(lead)).cloned())
    }

    async fn insert(&self, lead: &Lead) -> Result<Lead, DatabaseError> {
        self.ensure_online()?;
        let mut leads = self.leads.write().await;
        if leads.values().any(|l| l.owner_id == lead.owner_id && l.email == lead.email) {
            return Err(DatabaseError::UniqueViolation(LEADS_OWNER_EMAIL_KEY.to_string()));
        }
        leads.insert(lead.id, lead.clone());
        Ok(lead.clone())
    }

    async fn update_by_id(&self, owner: Uuid, id: Uuid, lead: &Lead) -> Result<Option<Lead>, DatabaseError> {
        self.ensure_online()?;
        let mut leads = self.leads.write().await;
        if !leads.get(&id).is_some_and(|existing| existing.owner_id == owner) {
            return Ok(None);
        }
        if leads.values().any(|l| l.id != id && l.owner_id == owner && l.email == lead.email) {
            return Err(DatabaseError::UniqueViolation(LEADS_OWNER_EMAIL_KEY.to_string()));
        }

        // Identity and ownership are not writable
        let Some(existing) = leads.get_mut(&id) else {
            return Ok(None);
        };
        *existing = Lead { id, owner_id: owner, created_at: existing.created_at, ..lead.clone() };
        Ok(Some(existing.clone()))
    }

    async fn delete_by_id(&self, owner: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        self.ensure_online()?;
        let mut leads = self.leads.write().await;
        if leads.get(&id).is_some_and(|existing| existing.owner_id == owner) {
            leads.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.ensure_online()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, DatabaseError> {
        self.ensure_online()?;
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        self.ensure_online()?;
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<Account, DatabaseError> {
        self.ensure_online()?;
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(DatabaseError::UniqueViolation(ACCOUNTS_EMAIL_KEY.to_string()));
        }
        accounts.insert(account.id, account.clone());
        Ok(account.clone())
    }
}
