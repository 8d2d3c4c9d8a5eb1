use uuid::Uuid;

use super::types::{Condition, FilterCondition, FilterSet, LeadColumn, Predicate, SqlParam};

/// Compiles normalized filters into an owner-scoped predicate and renders
/// predicates as parameterized WHERE clauses.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    /// Conjunction of every filter entry, always constrained to `owner_id`
    pub fn compile(filters: &FilterSet, owner_id: Uuid) -> Predicate {
        let mut predicate = Predicate::owned_by(owner_id);
        for (field, condition) in filters.iter() {
            let column = field.column();
            let compiled = match condition.clone() {
                FilterCondition::Equals(value) => Condition::Eq(column, value),
                FilterCondition::Contains(text) => Condition::Contains(column, text),
                FilterCondition::In(values) => Condition::In(column, values),
                FilterCondition::Gt(value) => Condition::Gt(column, value),
                FilterCondition::Lt(value) => Condition::Lt(column, value),
                FilterCondition::Between { min, max } => Condition::Between(column, min, max),
                FilterCondition::On { start, end } => {
                    Condition::Between(column, SqlParam::Timestamp(start), SqlParam::Timestamp(end))
                }
                FilterCondition::Before(t) => Condition::Lt(column, SqlParam::Timestamp(t)),
                FilterCondition::After(t) => Condition::Gt(column, SqlParam::Timestamp(t)),
                FilterCondition::Is(b) => Condition::Eq(column, SqlParam::Bool(b)),
            };
            predicate.push(compiled);
        }
        predicate
    }

    /// Render a predicate as SQL; placeholders are numbered after `starting_param_index`
    pub fn generate(predicate: &Predicate, starting_param_index: usize) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new(starting_param_index);
        let clause = filter_where.build(predicate);
        (clause, filter_where.param_values)
    }

    fn build(&mut self, predicate: &Predicate) -> String {
        let owner = self.param(SqlParam::Uuid(predicate.owner_id()));
        let mut sql_conditions = vec![format!("{} = {}", LeadColumn::OwnerId.quoted(), owner)];

        for condition in predicate.conditions() {
            sql_conditions.push(self.build_sql_condition(condition));
        }
        sql_conditions.join(" AND ")
    }

    fn build_sql_condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq(column, value) => format!("{} = {}", column.quoted(), self.param(value.clone())),
            Condition::Ne(column, value) => format!("{} <> {}", column.quoted(), self.param(value.clone())),
            Condition::Contains(column, text) => {
                let pattern = format!("%{}%", escape_like_pattern(text));
                format!("{} ILIKE {} ESCAPE '\\'", column.quoted(), self.param(SqlParam::Text(pattern)))
            }
            Condition::In(column, values) => {
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                format!("{} IN ({})", column.quoted(), params.join(", "))
            }
            Condition::Gt(column, value) => format!("{} > {}", column.quoted(), self.param(value.clone())),
            Condition::Lt(column, value) => format!("{} < {}", column.quoted(), self.param(value.clone())),
            Condition::Between(column, min, max) => {
                let min = self.param(min.clone());
                let max = self.param(max.clone());
                format!("{} BETWEEN {} AND {}", column.quoted(), min, max)
            }
        }
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE metacharacters so user input matches literally
pub fn escape_like_pattern(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::FilterField;
    use chrono::{TimeZone, Utc};

    fn owner() -> Uuid {
        Uuid::parse_str("6f1c0e4a-1d2b-4c3d-9e8f-0a1b2c3d4e5f").unwrap()
    }

    #[test]
    fn empty_filter_set_is_owner_scope_only() {
        let predicate = FilterWhere::compile(&FilterSet::new(), owner());
        let (sql, params) = FilterWhere::generate(&predicate, 0);
        assert_eq!(sql, "\"owner_id\" = $1");
        assert_eq!(params, vec![SqlParam::Uuid(owner())]);
    }

    #[test]
    fn renders_conditions_in_field_order() {
        let filters = FilterSet::new()
            .with(FilterField::Score, FilterCondition::Between { min: SqlParam::Int(20), max: SqlParam::Int(50) })
            .with(FilterField::Company, FilterCondition::Contains("tech".into()))
            .with(FilterField::IsQualified, FilterCondition::Is(true));

        let (sql, params) = FilterWhere::generate(&FilterWhere::compile(&filters, owner()), 0);
        assert_eq!(
            sql,
            "\"owner_id\" = $1 AND \"company\" ILIKE $2 ESCAPE '\\' AND \"score\" BETWEEN $3 AND $4 AND \"is_qualified\" = $5"
        );
        assert_eq!(
            params,
            vec![
                SqlParam::Uuid(owner()),
                SqlParam::Text("%tech%".into()),
                SqlParam::Int(20),
                SqlParam::Int(50),
                SqlParam::Bool(true),
            ]
        );
    }

    #[test]
    fn date_operators_map_to_strict_and_inclusive_ranges() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filters = FilterSet::new()
            .with(FilterField::CreatedAt, FilterCondition::Before(t))
            .with(FilterField::LastActivityAt, FilterCondition::After(t));
        let predicate = FilterWhere::compile(&filters, owner());
        assert_eq!(
            predicate.conditions(),
            &[
                Condition::Lt(LeadColumn::CreatedAt, SqlParam::Timestamp(t)),
                Condition::Gt(LeadColumn::LastActivityAt, SqlParam::Timestamp(t)),
            ]
        );

        let on = FilterSet::new().with(FilterField::CreatedAt, FilterCondition::On { start: t, end: t });
        let (sql, _) = FilterWhere::generate(&FilterWhere::compile(&on, owner()), 0);
        assert_eq!(sql, "\"owner_id\" = $1 AND \"created_at\" BETWEEN $2 AND $3");
    }

    #[test]
    fn empty_in_matches_nothing() {
        let filters = FilterSet::new().with(FilterField::Status, FilterCondition::In(vec![]));
        let (sql, params) = FilterWhere::generate(&FilterWhere::compile(&filters, owner()), 0);
        assert_eq!(sql, "\"owner_id\" = $1 AND 1=0");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn placeholders_continue_from_start_index() {
        let predicate = Predicate::owned_by(owner()).and(Condition::Ne(LeadColumn::Id, SqlParam::Uuid(owner())));
        let (sql, _) = FilterWhere::generate(&predicate, 3);
        assert_eq!(sql, "\"owner_id\" = $4 AND \"id\" <> $5");
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like_pattern("50%_off\\"), "50\\%\\_off\\\\");
        let filters = FilterSet::new().with(FilterField::City, FilterCondition::Contains("a_b".into()));
        let (_, params) = FilterWhere::generate(&FilterWhere::compile(&filters, owner()), 0);
        assert_eq!(params[1], SqlParam::Text("%a\\_b%".into()));
    }
}
