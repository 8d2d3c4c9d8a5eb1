use std::time::Instant;

use sqlx::{self, postgres::PgArguments, FromRow, PgPool, Row};

use crate::database::manager::DatabaseError;
use crate::filter::types::{FilterOrderInfo, Predicate, SqlParam, SqlResult};
use crate::filter::Filter;

/// Typed SELECT / COUNT execution over a [`Filter`]
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        Ok(Self {
            filter: Filter::new(table_name)?,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn where_clause(mut self, predicate: Predicate) -> Self {
        self.filter.where_clause(predicate);
        self
    }

    pub fn order(mut self, order: Vec<FilterOrderInfo>) -> Self {
        self.filter.order(order);
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Result<Self, DatabaseError> {
        self.filter.limit(limit, offset)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let started = Instant::now();
        let rows = q.fetch_all(pool).await?;
        warn_if_slow(&sql_result, started);
        Ok(rows)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.filter.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let started = Instant::now();
        let row = q.fetch_optional(pool).await?;
        warn_if_slow(&sql_result, started);
        Ok(row)
    }

    pub async fn count(self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql_result = self.filter.to_count_sql();
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let started = Instant::now();
        let row = q.fetch_one(pool).await?;
        warn_if_slow(&sql_result, started);
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

fn warn_if_slow(sql_result: &SqlResult, started: Instant) {
    let config = &crate::config::CONFIG.database;
    let elapsed = started.elapsed();
    if config.enable_slow_query_warning && elapsed.as_millis() >= u128::from(config.slow_query_threshold_ms) {
        tracing::warn!(
            elapsed_ms = elapsed.as_millis() as u64,
            params = sql_result.params.len(),
            sql = %sql_result.query,
            "Slow query"
        );
    }
}

pub fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Float(f) => q.bind(*f),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Timestamp(t) => q.bind(*t),
    }
}

pub fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        SqlParam::Uuid(u) => q.bind(*u),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Float(f) => q.bind(*f),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Timestamp(t) => q.bind(*t),
    }
}
