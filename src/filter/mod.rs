pub mod types;
pub mod filter;
pub mod filter_parser;
pub mod filter_where;
pub mod filter_order;
pub mod evaluate;
pub mod pagination;
pub mod query_params;
pub mod error;

pub use types::*;
pub use error::FilterError;
pub use filter::Filter;
pub use filter_parser::FilterParser;
pub use filter_where::FilterWhere;
pub use filter_order::FilterOrder;
pub use pagination::{Page, PageRequest};
pub use query_params::decode_query;
