// Chainable query handles and the backends that resolve them

pub mod builder;
pub mod filter;
pub mod mock;
pub mod rest;
pub mod result;

pub use builder::QueryBuilder;
pub use filter::{Direction, Filter, IsValue, Operator, Order};
pub use mock::MockBackend;
pub use rest::RestBackend;
pub use result::QueryResult;

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select,
    Insert(Value),
    Update(Value),
    Delete,
}

/// How many rows the caller expects back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cardinality {
    #[default]
    Many,
    /// Exactly one row; none is an error.
    Single,
    /// Zero or one row.
    MaybeSingle,
}

/// Everything a handle has recorded, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub operation: Operation,
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub orders: Vec<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub cardinality: Cardinality,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            operation: Operation::Select,
            columns: None,
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            cardinality: Cardinality::Many,
        }
    }
}

/// Resolves recorded requests. Implemented by the PostgREST client and by the
/// in-memory double; neither returns `Err`, failures travel in the pair.
#[async_trait]
pub trait DataBackend: Send + Sync {
    async fn execute(&self, request: QueryRequest) -> QueryResult<Value>;

    async fn rpc(&self, function: &str, args: Value) -> QueryResult<Value>;
}
