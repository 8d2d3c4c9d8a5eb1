use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FieldKind, FilterCondition, FilterField, FilterOperator, FilterSet, SqlParam};
use crate::database::models::{LeadSource, LeadStatus};

/// Keys consumed by pagination rather than filtering
pub const PAGINATION_KEYS: [&str; 2] = ["page", "limit"];

/// Normalizes untyped request parameters into a [`FilterSet`].
///
/// Unrecognized keys are ignored. A recognized field whose operator is not
/// permitted for it is dropped without error; a permitted operator carrying a
/// malformed value rejects the whole request.
pub struct FilterParser;

impl FilterParser {
    pub fn parse(params: &Value) -> Result<FilterSet, FilterError> {
        let map = match params {
            Value::Object(map) => map,
            Value::Null => return Ok(FilterSet::new()),
            _ => return Err(FilterError::invalid_filter("query", "filters must be an object")),
        };

        let mut filters = FilterSet::new();
        for (key, raw) in map {
            if PAGINATION_KEYS.contains(&key.as_str()) {
                continue;
            }
            let Some(field) = FilterField::from_key(key) else {
                tracing::trace!(key = %key, "ignoring unrecognized filter key");
                continue;
            };
            if let Some(condition) = Self::parse_field(field, raw)? {
                filters.insert(field, condition);
            }
        }
        Ok(filters)
    }

    fn parse_field(field: FilterField, raw: &Value) -> Result<Option<FilterCondition>, FilterError> {
        if field.kind() == FieldKind::Boolean {
            return parse_bool(field, raw).map(|b| Some(FilterCondition::Is(b)));
        }

        let entry = raw
            .as_object()
            .ok_or_else(|| FilterError::invalid_filter(field.key(), "expected {operator, value}"))?;
        let operator_name = entry
            .get("operator")
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::invalid_filter(field.key(), "missing operator"))?;

        let operator = match FilterOperator::parse(operator_name) {
            Some(op) if field.allows(op) => op,
            _ => {
                if crate::config::CONFIG.filter.debug_logging {
                    tracing::debug!(field = %field, operator = %operator_name, "dropping filter with unsupported operator");
                }
                return Ok(None);
            }
        };

        let value = entry
            .get("value")
            .filter(|v| !v.is_null())
            .ok_or_else(|| FilterError::invalid_filter(field.key(), "missing value"))?;

        let condition = match operator {
            FilterOperator::Equals => FilterCondition::Equals(parse_scalar(field, value)?),
            FilterOperator::Contains => FilterCondition::Contains(parse_text(field, value)?),
            FilterOperator::In => FilterCondition::In(parse_list(field, value)?),
            FilterOperator::Gt => FilterCondition::Gt(parse_bound(field, value)?),
            FilterOperator::Lt => FilterCondition::Lt(parse_bound(field, value)?),
            FilterOperator::Between => parse_between(field, value)?,
            FilterOperator::On => {
                let day = parse_day(field, value)?;
                let (start, end) = local_day_bounds(field, day)?;
                FilterCondition::On { start, end }
            }
            FilterOperator::Before => FilterCondition::Before(parse_instant(field, value)?),
            FilterOperator::After => FilterCondition::After(parse_instant(field, value)?),
        };
        Ok(Some(condition))
    }
}

fn parse_scalar(field: FilterField, value: &Value) -> Result<SqlParam, FilterError> {
    match field.kind() {
        FieldKind::Text => parse_text(field, value).map(SqlParam::Text),
        FieldKind::Source => {
            let raw = expect_str(field, value)?;
            raw.trim()
                .parse::<LeadSource>()
                .map(|s| SqlParam::Text(s.as_str().to_string()))
                .map_err(|e| FilterError::invalid_value(field.key(), e))
        }
        FieldKind::Status => {
            let raw = expect_str(field, value)?;
            raw.trim()
                .parse::<LeadStatus>()
                .map(|s| SqlParam::Text(s.as_str().to_string()))
                .map_err(|e| FilterError::invalid_value(field.key(), e))
        }
        FieldKind::Integer => parse_integer(field, value).map(SqlParam::Int),
        FieldKind::Number => parse_number(field, value).map(SqlParam::Float),
        FieldKind::Boolean => parse_bool(field, value).map(SqlParam::Bool),
        FieldKind::Timestamp => parse_instant(field, value).map(SqlParam::Timestamp),
    }
}

/// Range bounds on integer fields may be fractional (`score gt 49.5`)
fn parse_bound(field: FilterField, value: &Value) -> Result<SqlParam, FilterError> {
    if field.kind() != FieldKind::Integer {
        return parse_scalar(field, value);
    }
    match parse_integer(field, value) {
        Ok(i) => Ok(SqlParam::Int(i)),
        Err(_) => parse_number(field, value).map(SqlParam::Float),
    }
}

fn expect_str<'a>(field: FilterField, value: &'a Value) -> Result<&'a str, FilterError> {
    value
        .as_str()
        .ok_or_else(|| FilterError::invalid_value(field.key(), "expected a string"))
}

fn parse_text(field: FilterField, value: &Value) -> Result<String, FilterError> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(FilterError::invalid_value(field.key(), "expected a string")),
    };
    // Stored emails are normalized to lower case
    if field == FilterField::Email {
        Ok(text.to_lowercase())
    } else {
        Ok(text)
    }
}

fn parse_list(field: FilterField, value: &Value) -> Result<Vec<SqlParam>, FilterError> {
    let items: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
        _ => return Err(FilterError::invalid_value(field.key(), "expected a list of values")),
    };
    items.iter().map(|item| parse_scalar(field, item)).collect()
}

fn parse_between(field: FilterField, value: &Value) -> Result<FilterCondition, FilterError> {
    let bounds = value
        .as_object()
        .ok_or_else(|| FilterError::invalid_value(field.key(), "between requires an object"))?;

    let (low_key, high_key) = if field.kind() == FieldKind::Timestamp { ("start", "end") } else { ("min", "max") };
    let low = bound(field, bounds, low_key)?;
    let high = bound(field, bounds, high_key)?;

    Ok(FilterCondition::Between {
        min: parse_bound(field, low)?,
        max: parse_bound(field, high)?,
    })
}

fn bound<'a>(field: FilterField, bounds: &'a Map<String, Value>, key: &str) -> Result<&'a Value, FilterError> {
    bounds
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| FilterError::invalid_value(field.key(), format!("between requires '{}'", key)))
}

fn parse_integer(field: FilterField, value: &Value) -> Result<i32, FilterError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FilterError::invalid_value(field.key(), format!("expected an integer, got {}", value)))
}

fn parse_number(field: FilterField, value: &Value) -> Result<f64, FilterError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| FilterError::invalid_value(field.key(), format!("expected a number, got {}", value)))
}

fn parse_bool(field: FilterField, value: &Value) -> Result<bool, FilterError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(FilterError::invalid_value(field.key(), format!("expected true or false, got {}", value))),
    }
}

fn parse_instant(field: FilterField, value: &Value) -> Result<DateTime<Utc>, FilterError> {
    let raw = expect_str(field, value)?.trim();
    parse_timestamp(raw).ok_or_else(|| FilterError::invalid_value(field.key(), format!("'{}' is not a valid date", raw)))
}

/// Parse an ISO 8601 timestamp. Date-only values are midnight UTC; a
/// date-time without an offset is read in the server's local zone.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Local.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// The calendar day named by the value, as seen in the server's local zone
fn parse_day(field: FilterField, value: &Value) -> Result<NaiveDate, FilterError> {
    let raw = expect_str(field, value)?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_instant(field, value).map(|dt| dt.with_timezone(&Local).date_naive())
}

/// `[00:00:00.000, 23:59:59.999]` of a local calendar day, in UTC
pub fn local_day_bounds(field: FilterField, day: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), FilterError> {
    let invalid = || FilterError::invalid_value(field.key(), format!("cannot resolve local day {}", day));

    let start = day.and_hms_milli_opt(0, 0, 0, 0).ok_or_else(invalid)?;
    let end = day.and_hms_milli_opt(23, 59, 59, 999).ok_or_else(invalid)?;

    let start = Local.from_local_datetime(&start).earliest().ok_or_else(invalid)?;
    let end = Local.from_local_datetime(&end).latest().ok_or_else(invalid)?;
    Ok((start.with_timezone(&Utc), end.with_timezone(&Utc)))
}
