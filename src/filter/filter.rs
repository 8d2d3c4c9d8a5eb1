use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, Predicate, SqlResult};

/// SELECT / COUNT builder over a single table, driven by a compiled predicate
pub struct Filter {
    table_name: String,
    predicate: Option<Predicate>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            predicate: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn where_clause(&mut self, predicate: Predicate) -> &mut Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order(&mut self, order: Vec<FilterOrderInfo>) -> &mut Self {
        self.order_data = order;
        self
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        self.log_sql(&query);
        SqlResult { query, params: where_result.params }
    }

    pub fn to_where_sql(&self) -> SqlResult {
        match self.predicate {
            Some(ref predicate) => {
                let (query, params) = FilterWhere::generate(predicate, 0);
                SqlResult { query, params }
            }
            None => SqlResult { query: String::new(), params: vec![] },
        }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_result.query)
        };
        self.log_sql(&query);
        SqlResult { query, params: where_result.params }
    }

    fn log_sql(&self, query: &str) {
        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!(table = %self.table_name, sql = %query, "rendered filter query");
        }
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        };
        if !(first.is_ascii_alphabetic() || first == '_') || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
