//! In-memory evaluation of predicates, mirroring the SQL rendering in
//! `filter_where` so that both stores select the same rows.

use std::cmp::Ordering;

use super::types::{Condition, Predicate, SqlParam};
use crate::database::models::Lead;

impl Predicate {
    pub fn matches(&self, lead: &Lead) -> bool {
        lead.owner_id == self.owner_id() && self.conditions().iter().all(|c| c.matches(lead))
    }
}

impl Condition {
    pub fn matches(&self, lead: &Lead) -> bool {
        match self {
            Condition::Eq(column, expected) => {
                lead.value_of(*column).is_some_and(|v| compare(&v, expected) == Some(Ordering::Equal))
            }
            // SQL `<>` is unknown for NULL, so absent values never match
            Condition::Ne(column, expected) => lead
                .value_of(*column)
                .is_some_and(|v| compare(&v, expected).is_some_and(|o| o != Ordering::Equal)),
            Condition::Contains(column, needle) => match lead.value_of(*column) {
                Some(SqlParam::Text(haystack)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Condition::In(column, values) => lead
                .value_of(*column)
                .is_some_and(|v| values.iter().any(|candidate| compare(&v, candidate) == Some(Ordering::Equal))),
            Condition::Gt(column, bound) => {
                lead.value_of(*column).is_some_and(|v| compare(&v, bound) == Some(Ordering::Greater))
            }
            Condition::Lt(column, bound) => {
                lead.value_of(*column).is_some_and(|v| compare(&v, bound) == Some(Ordering::Less))
            }
            Condition::Between(column, min, max) => lead.value_of(*column).is_some_and(|v| {
                matches!(compare(&v, min), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(&v, max), Some(Ordering::Less | Ordering::Equal))
            }),
        }
    }
}

/// Ordering between two scalars of compatible type; `None` when incomparable
pub(crate) fn compare(left: &SqlParam, right: &SqlParam) -> Option<Ordering> {
    match (left, right) {
        (SqlParam::Uuid(a), SqlParam::Uuid(b)) => Some(a.cmp(b)),
        (SqlParam::Text(a), SqlParam::Text(b)) => Some(a.cmp(b)),
        (SqlParam::Int(a), SqlParam::Int(b)) => Some(a.cmp(b)),
        (SqlParam::Float(a), SqlParam::Float(b)) => a.partial_cmp(b),
        (SqlParam::Int(a), SqlParam::Float(b)) => f64::from(*a).partial_cmp(b),
        (SqlParam::Float(a), SqlParam::Int(b)) => a.partial_cmp(&f64::from(*b)),
        (SqlParam::Bool(a), SqlParam::Bool(b)) => Some(a.cmp(b)),
        (SqlParam::Timestamp(a), SqlParam::Timestamp(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
