use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::filter::types::{LeadColumn, SqlParam};

/// Where a lead came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Website,
    FacebookAds,
    GoogleAds,
    Referral,
    Events,
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 6] = [
        LeadSource::Website,
        LeadSource::FacebookAds,
        LeadSource::GoogleAds,
        LeadSource::Referral,
        LeadSource::Events,
        LeadSource::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::FacebookAds => "facebook_ads",
            LeadSource::GoogleAds => "google_ads",
            LeadSource::Referral => "referral",
            LeadSource::Events => "events",
            LeadSource::Other => "other",
        }
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a valid source", s))
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales pipeline stage. Any transition is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Lost,
        LeadStatus::Won,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Won => "won",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a valid status", s))
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub owner_id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Column value as a comparable scalar; `None` for SQL NULL
    pub fn value_of(&self, column: LeadColumn) -> Option<SqlParam> {
        let text = |s: &Option<String>| s.clone().map(SqlParam::Text);
        match column {
            LeadColumn::Id => Some(SqlParam::Uuid(self.id)),
            LeadColumn::OwnerId => Some(SqlParam::Uuid(self.owner_id)),
            LeadColumn::Email => Some(SqlParam::Text(self.email.clone())),
            LeadColumn::Company => text(&self.company),
            LeadColumn::City => text(&self.city),
            LeadColumn::Status => Some(SqlParam::Text(self.status.as_str().to_string())),
            LeadColumn::Source => Some(SqlParam::Text(self.source.as_str().to_string())),
            LeadColumn::Score => Some(SqlParam::Int(self.score)),
            LeadColumn::LeadValue => Some(SqlParam::Float(self.lead_value)),
            LeadColumn::IsQualified => Some(SqlParam::Bool(self.is_qualified)),
            LeadColumn::CreatedAt => Some(SqlParam::Timestamp(self.created_at)),
            LeadColumn::LastActivityAt => self.last_activity_at.map(SqlParam::Timestamp),
        }
    }
}

// Enum columns are stored as TEXT and validated on the way out
impl<'r> FromRow<'r, PgRow> for Lead {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let decode = |column: &str, message: String| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: message.into(),
        };
        let source: String = row.try_get("source")?;
        let status: String = row.try_get("status")?;

        Ok(Lead {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            company: row.try_get("company")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            source: source.parse().map_err(|e| decode("source", e))?,
            status: status.parse().map_err(|e| decode("status", e))?,
            score: row.try_get("score")?,
            lead_value: row.try_get("lead_value")?,
            last_activity_at: row.try_get("last_activity_at")?,
            is_qualified: row.try_get("is_qualified")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_wire_names() {
        for source in LeadSource::ALL {
            assert_eq!(source.as_str().parse::<LeadSource>(), Ok(source));
        }
        for status in LeadStatus::ALL {
            assert_eq!(status.as_str().parse::<LeadStatus>(), Ok(status));
        }
        assert!("Website".parse::<LeadSource>().is_err());
        assert!("archived".parse::<LeadStatus>().is_err());
        assert_eq!(LeadStatus::default(), LeadStatus::New);
    }

    #[test]
    fn serializes_camel_case() {
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            email: "jane@example.com".into(),
            phone: None,
            company: None,
            city: None,
            state: None,
            source: LeadSource::FacebookAds,
            status: LeadStatus::Contacted,
            score: 10,
            lead_value: 0.0,
            last_activity_at: None,
            is_qualified: false,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["source"], "facebook_ads");
        assert_eq!(json["status"], "contacted");
        assert_eq!(json["leadValue"], 0.0);
        assert!(json.get("ownerId").is_some());
        assert!(json.get("isQualified").is_some());
        assert!(json.get("first_name").is_none());
    }
}
