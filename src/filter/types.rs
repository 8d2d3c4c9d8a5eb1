use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operators accepted on the lead listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    In,
    Gt,
    Lt,
    Between,
    On,
    Before,
    After,
}

impl FilterOperator {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "equals" => FilterOperator::Equals,
            "contains" => FilterOperator::Contains,
            "in" => FilterOperator::In,
            "gt" => FilterOperator::Gt,
            "lt" => FilterOperator::Lt,
            "between" => FilterOperator::Between,
            "on" => FilterOperator::On,
            "before" => FilterOperator::Before,
            "after" => FilterOperator::After,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::In => "in",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Between => "between",
            FilterOperator::On => "on",
            FilterOperator::Before => "before",
            FilterOperator::After => "after",
        }
    }
}

/// How a filter value is coerced from request input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Source,
    Status,
    Integer,
    Number,
    Boolean,
    Timestamp,
}

/// Filter keys recognized on the lead listing endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Email,
    Company,
    City,
    Status,
    Source,
    Score,
    LeadValue,
    IsQualified,
    CreatedAt,
    LastActivityAt,
}

impl FilterField {
    pub const ALL: [FilterField; 10] = [
        FilterField::Email,
        FilterField::Company,
        FilterField::City,
        FilterField::Status,
        FilterField::Source,
        FilterField::Score,
        FilterField::LeadValue,
        FilterField::IsQualified,
        FilterField::CreatedAt,
        FilterField::LastActivityAt,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Query parameter name
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::Email => "email",
            FilterField::Company => "company",
            FilterField::City => "city",
            FilterField::Status => "status",
            FilterField::Source => "source",
            FilterField::Score => "score",
            FilterField::LeadValue => "lead_value",
            FilterField::IsQualified => "is_qualified",
            FilterField::CreatedAt => "created_at",
            FilterField::LastActivityAt => "last_activity_at",
        }
    }

    pub fn column(&self) -> LeadColumn {
        match self {
            FilterField::Email => LeadColumn::Email,
            FilterField::Company => LeadColumn::Company,
            FilterField::City => LeadColumn::City,
            FilterField::Status => LeadColumn::Status,
            FilterField::Source => LeadColumn::Source,
            FilterField::Score => LeadColumn::Score,
            FilterField::LeadValue => LeadColumn::LeadValue,
            FilterField::IsQualified => LeadColumn::IsQualified,
            FilterField::CreatedAt => LeadColumn::CreatedAt,
            FilterField::LastActivityAt => LeadColumn::LastActivityAt,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FilterField::Email | FilterField::Company | FilterField::City => FieldKind::Text,
            FilterField::Status => FieldKind::Status,
            FilterField::Source => FieldKind::Source,
            FilterField::Score => FieldKind::Integer,
            FilterField::LeadValue => FieldKind::Number,
            FilterField::IsQualified => FieldKind::Boolean,
            FilterField::CreatedAt | FilterField::LastActivityAt => FieldKind::Timestamp,
        }
    }

    /// Operators permitted for this field. Boolean fields take a bare value.
    pub fn operators(&self) -> &'static [FilterOperator] {
        use FilterOperator::*;
        match self.kind() {
            FieldKind::Text => &[Equals, Contains],
            FieldKind::Source | FieldKind::Status => &[Equals, In],
            FieldKind::Integer | FieldKind::Number => &[Equals, Gt, Lt, Between],
            FieldKind::Boolean => &[],
            FieldKind::Timestamp => &[On, Before, After, Between],
        }
    }

    pub fn allows(&self, operator: FilterOperator) -> bool {
        self.operators().contains(&operator)
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Typed scalar produced by the parser and bound by the store
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Uuid(Uuid),
    Text(String),
    Int(i32),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// A normalized `{operator, value}` pair for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Equals(SqlParam),
    Contains(String),
    In(Vec<SqlParam>),
    Gt(SqlParam),
    Lt(SqlParam),
    /// Inclusive on both ends
    Between { min: SqlParam, max: SqlParam },
    /// Calendar day already expanded to `[00:00:00.000, 23:59:59.999]`
    On { start: DateTime<Utc>, end: DateTime<Utc> },
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
    Is(bool),
}

/// Normalized filters keyed by field, at most one condition per field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: BTreeMap<FilterField, FilterCondition>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FilterField, condition: FilterCondition) -> &mut Self {
        self.entries.insert(field, condition);
        self
    }

    pub fn with(mut self, field: FilterField, condition: FilterCondition) -> Self {
        self.insert(field, condition);
        self
    }

    pub fn get(&self, field: FilterField) -> Option<&FilterCondition> {
        self.entries.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FilterField, &FilterCondition)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Columns of the `leads` table that predicates may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadColumn {
    Id,
    OwnerId,
    Email,
    Company,
    City,
    Status,
    Source,
    Score,
    LeadValue,
    IsQualified,
    CreatedAt,
    LastActivityAt,
}

impl LeadColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadColumn::Id => "id",
            LeadColumn::OwnerId => "owner_id",
            LeadColumn::Email => "email",
            LeadColumn::Company => "company",
            LeadColumn::City => "city",
            LeadColumn::Status => "status",
            LeadColumn::Source => "source",
            LeadColumn::Score => "score",
            LeadColumn::LeadValue => "lead_value",
            LeadColumn::IsQualified => "is_qualified",
            LeadColumn::CreatedAt => "created_at",
            LeadColumn::LastActivityAt => "last_activity_at",
        }
    }

    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.as_str())
    }
}

/// A single store-level comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(LeadColumn, SqlParam),
    Ne(LeadColumn, SqlParam),
    /// Case-insensitive literal substring
    Contains(LeadColumn, String),
    In(LeadColumn, Vec<SqlParam>),
    Gt(LeadColumn, SqlParam),
    Lt(LeadColumn, SqlParam),
    Between(LeadColumn, SqlParam, SqlParam),
}

/// Conjunction of conditions, always scoped to a single owner.
///
/// The owner is fixed at construction and cannot be removed, so a predicate
/// can only ever select rows belonging to that account.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    owner_id: Uuid,
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self { owner_id, conditions: vec![] }
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOrderInfo {
    pub column: LeadColumn,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
