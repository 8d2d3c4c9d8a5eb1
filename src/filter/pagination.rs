use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Page and page size taken from request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page > 0 { page } else { DEFAULT_PAGE },
            limit: if limit > 0 { limit.min(MAX_LIMIT) } else { DEFAULT_LIMIT },
        }
    }

    /// Reads `page` and `limit`; anything missing, non-numeric or non-positive
    /// falls back to the default
    pub fn from_params(params: &Value) -> Self {
        let page = positive_int(params.get("page")).unwrap_or(DEFAULT_PAGE);
        let limit = positive_int(params.get("limit")).unwrap_or(DEFAULT_LIMIT);
        Self::new(page, limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn positive_int(value: Option<&Value>) -> Option<i64> {
    let n = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (n > 0).then_some(n)
}

/// Paginated envelope returned by the listing endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            data,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total_pages(total, request.limit),
        }
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
