//! Request body validation for lead create and update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::models::{Lead, LeadSource, LeadStatus};
use crate::filter::filter_parser::parse_timestamp;
use crate::services::error::ServiceError;

/// Keys managed by the server; a body carrying any of them is rejected
pub const SYSTEM_FIELDS: [&str; 10] = [
    "id", "_id", "ownerId", "owner_id", "owner", "user", "createdAt", "created_at", "updatedAt", "updated_at",
];

/// A validated new lead, before identity and timestamps are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: i32,
    pub lead_value: f64,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub is_qualified: bool,
}

impl LeadDraft {
    pub fn from_json(body: &Value) -> Result<Self, ServiceError> {
        let mut reader = FieldReader::new(body)?;

        let first_name = reader.required_text("firstName");
        let last_name = reader.required_text("lastName");
        let email = reader.email("email").flatten();
        if email.is_none() && !reader.errors.contains_key("email") {
            reader.fail("email", "Email is required");
        }
        let phone = reader.optional_text("phone").flatten();
        let company = reader.optional_text("company").flatten();
        let city = reader.optional_text("city").flatten();
        let state = reader.optional_text("state").flatten();
        let source = reader.source("source");
        if source.is_none() && !reader.errors.contains_key("source") {
            reader.fail("source", "Source is required");
        }
        let status = reader.status("status").unwrap_or_default();
        let score = reader.score("score").unwrap_or(0);
        let lead_value = reader.lead_value("leadValue").unwrap_or(0.0);
        let last_activity_at = reader.timestamp("lastActivityAt").flatten();
        let is_qualified = reader.boolean("isQualified").unwrap_or(false);

        reader.finish()?;
        match (first_name, last_name, email, source) {
            (Some(first_name), Some(last_name), Some(email), Some(source)) => Ok(LeadDraft {
                first_name,
                last_name,
                email,
                phone,
                company,
                city,
                state,
                source,
                status,
                score,
                lead_value,
                last_activity_at,
                is_qualified,
            }),
            _ => Err(ServiceError::validation("Validation failed", HashMap::new())),
        }
    }

    pub fn into_lead(self, owner_id: Uuid, now: DateTime<Utc>) -> Lead {
        Lead {
            id: Uuid::new_v4(),
            owner_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            city: self.city,
            state: self.state,
            source: self.source,
            status: self.status,
            score: self.score,
            lead_value: self.lead_value,
            last_activity_at: self.last_activity_at,
            is_qualified: self.is_qualified,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated partial update. Outer `None` leaves a field unchanged; for
/// nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub company: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub score: Option<i32>,
    pub lead_value: Option<f64>,
    pub last_activity_at: Option<Option<DateTime<Utc>>>,
    pub is_qualified: Option<bool>,
}

impl LeadChanges {
    pub fn from_json(body: &Value) -> Result<Self, ServiceError> {
        let mut reader = FieldReader::new(body)?;

        let changes = LeadChanges {
            first_name: reader.present("firstName").then(|| reader.required_text("firstName")).flatten(),
            last_name: reader.present("lastName").then(|| reader.required_text("lastName")).flatten(),
            email: match reader.email("email") {
                Some(None) => {
                    reader.fail("email", "Email cannot be empty");
                    None
                }
                other => other.flatten(),
            },
            phone: reader.optional_text("phone"),
            company: reader.optional_text("company"),
            city: reader.optional_text("city"),
            state: reader.optional_text("state"),
            source: reader.source("source"),
            status: reader.status("status"),
            score: reader.score("score"),
            lead_value: reader.lead_value("leadValue"),
            last_activity_at: reader.timestamp("lastActivityAt"),
            is_qualified: reader.boolean("isQualified"),
        };

        reader.finish()?;
        Ok(changes)
    }

    /// Overlay the changes onto a stored lead
    pub fn apply(self, lead: &mut Lead) {
        if let Some(v) = self.first_name {
            lead.first_name = v;
        }
        if let Some(v) = self.last_name {
            lead.last_name = v;
        }
        if let Some(v) = self.email {
            lead.email = v;
        }
        if let Some(v) = self.phone {
            lead.phone = v;
        }
        if let Some(v) = self.company {
            lead.company = v;
        }
        if let Some(v) = self.city {
            lead.city = v;
        }
        if let Some(v) = self.state {
            lead.state = v;
        }
        if let Some(v) = self.source {
            lead.source = v;
        }
        if let Some(v) = self.status {
            lead.status = v;
        }
        if let Some(v) = self.score {
            lead.score = v;
        }
        if let Some(v) = self.lead_value {
            lead.lead_value = v;
        }
        if let Some(v) = self.last_activity_at {
            lead.last_activity_at = v;
        }
        if let Some(v) = self.is_qualified {
            lead.is_qualified = v;
        }
    }
}

/// Trim and lower-case an email, rejecting anything without a plausible shape
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    valid.then_some(email)
}

/// Reads typed fields out of a JSON object, collecting one error per field
struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    errors: HashMap<String, String>,
}

impl<'a> FieldReader<'a> {
    fn new(body: &'a Value) -> Result<Self, ServiceError> {
        let body = body
            .as_object()
            .ok_or_else(|| ServiceError::validation("Request body must be a JSON object", HashMap::new()))?;

        let mut errors = HashMap::new();
        for key in SYSTEM_FIELDS {
            if body.contains_key(key) {
                errors.insert(key.to_string(), format!("System field '{}' cannot be set via API", key));
            }
        }
        Ok(Self { body, errors })
    }

    fn finish(self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation("Validation failed", self.errors))
        }
    }

    fn fail(&mut self, key: &str, message: impl Into<String>) {
        self.errors.insert(key.to_string(), message.into());
    }

    fn present(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    /// `None` when absent; `Some(None)` when explicitly null
    fn raw(&self, key: &str) -> Option<Option<&'a Value>> {
        self.body.get(key).map(|v| if v.is_null() { None } else { Some(v) })
    }

    fn required_text(&mut self, key: &str) -> Option<String> {
        match self.raw(key).flatten() {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::String(_)) | None => {
                self.fail(key, format!("{} is required", key));
                None
            }
            Some(_) => {
                self.fail(key, format!("{} must be a string", key));
                None
            }
        }
    }

    fn optional_text(&mut self, key: &str) -> Option<Option<String>> {
        match self.raw(key)? {
            None => Some(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Some((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(_) => {
                self.fail(key, format!("{} must be a string", key));
                None
            }
        }
    }

    fn email(&mut self, key: &str) -> Option<Option<String>> {
        match self.raw(key)? {
            None => Some(None),
            Some(Value::String(s)) if s.trim().is_empty() => Some(None),
            Some(Value::String(s)) => match normalize_email(s) {
                Some(email) => Some(Some(email)),
                None => {
                    self.fail(key, "Invalid email address");
                    None
                }
            },
            Some(_) => {
                self.fail(key, "Invalid email address");
                None
            }
        }
    }

    fn source(&mut self, key: &str) -> Option<LeadSource> {
        let raw = self.raw(key)?;
        match raw.and_then(Value::as_str).map(str::parse::<LeadSource>) {
            Some(Ok(source)) => Some(source),
            Some(Err(message)) => {
                self.fail(key, message);
                None
            }
            None => {
                self.fail(key, "Source must be one of website, facebook_ads, google_ads, referral, events, other");
                None
            }
        }
    }

    fn status(&mut self, key: &str) -> Option<LeadStatus> {
        let raw = self.raw(key)?;
        match raw.and_then(Value::as_str).map(str::parse::<LeadStatus>) {
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => {
                self.fail(key, message);
                None
            }
            None => {
                self.fail(key, "Status must be one of new, contacted, qualified, lost, won");
                None
            }
        }
    }

    fn score(&mut self, key: &str) -> Option<i32> {
        let raw = self.raw(key)?;
        let parsed = match raw {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if (0..=100).contains(&n) => i32::try_from(n).ok(),
            _ => {
                self.fail(key, "Score must be an integer between 0 and 100");
                None
            }
        }
    }

    fn lead_value(&mut self, key: &str) -> Option<f64> {
        let raw = self.raw(key)?;
        let parsed = match raw {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() && n >= 0.0 => Some(n),
            _ => {
                self.fail(key, "Lead value must be a non-negative number");
                None
            }
        }
    }

    fn timestamp(&mut self, key: &str) -> Option<Option<DateTime<Utc>>> {
        match self.raw(key)? {
            None => Some(None),
            Some(Value::String(s)) if s.trim().is_empty() => Some(None),
            Some(Value::String(s)) => match parse_timestamp(s) {
                Some(ts) => Some(Some(ts)),
                None => {
                    self.fail(key, "Must be an ISO 8601 date");
                    None
                }
            },
            Some(_) => {
                self.fail(key, "Must be an ISO 8601 date");
                None
            }
        }
    }

    fn boolean(&mut self, key: &str) -> Option<bool> {
        let raw = self.raw(key)?;
        match raw {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) if s == "true" => Some(true),
            Some(Value::String(s)) if s == "false" => Some(false),
            _ => {
                self.fail(key, "Must be true or false");
                None
            }
        }
    }
}
