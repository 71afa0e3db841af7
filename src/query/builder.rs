use std::fmt::Display;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

use super::filter::{containment_literal, list_literal};
use super::{
    Cardinality, DataBackend, Direction, Filter, IsValue, Operation, Operator, Order,
    QueryRequest, QueryResult,
};

/// In-progress operation on one table.
///
/// Every intent, filter and shaping method records into the handle and
/// returns the same handle, so calls chain:
///
/// ```ignore
/// let result = client
///     .from("products")
///     .select("*")
///     .eq("category_id", 1)
///     .order("name", Direction::Asc)
///     .limit(10)
///     .fetch::<Product>()
///     .await;
/// ```
///
/// Nothing runs until a terminal method (`execute`, `fetch`, `single`,
/// `maybe_single`) is awaited.
pub struct QueryBuilder {
    backend: Arc<dyn DataBackend>,
    request: QueryRequest,
    invalid: Option<String>,
}

impl QueryBuilder {
    pub fn new(backend: Arc<dyn DataBackend>, table: &str) -> Self {
        let invalid = if table.trim().is_empty() {
            Some("table name must not be empty".to_string())
        } else {
            None
        };
        Self {
            backend,
            request: QueryRequest::new(table),
            invalid,
        }
    }

    pub fn request(&self) -> &QueryRequest {
        &self.request
    }

    fn reject(&mut self, reason: String) -> &mut Self {
        if self.invalid.is_none() {
            self.invalid = Some(reason);
        }
        self
    }

    fn push(&mut self, column: &str, operator: Operator, value: impl Display) -> &mut Self {
        self.request
            .filters
            .push(Filter::column(column, operator, value));
        self
    }

    // Intent

    pub fn select(&mut self, columns: &str) -> &mut Self {
        self.request.columns = Some(columns.to_string());
        self
    }

    pub fn insert<T: Serialize + ?Sized>(&mut self, records: &T) -> &mut Self {
        match serde_json::to_value(records) {
            Ok(value) => {
                self.request.operation = Operation::Insert(value);
                self
            }
            Err(e) => self.reject(format!("insert payload: {}", e)),
        }
    }

    pub fn update<T: Serialize + ?Sized>(&mut self, patch: &T) -> &mut Self {
        match serde_json::to_value(patch) {
            Ok(value) => {
                self.request.operation = Operation::Update(value);
                self
            }
            Err(e) => self.reject(format!("update payload: {}", e)),
        }
    }

    pub fn delete(&mut self) -> &mut Self {
        self.request.operation = Operation::Delete;
        self
    }

    // Filters

    pub fn eq(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.push(column, Operator::Eq, value)
    }

    pub fn neq(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.push(column, Operator::Neq, value)
    }

    pub fn gt(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.push(column, Operator::Gt, value)
    }

    pub fn gte(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.push(column, Operator::Gte, value)
    }

    pub fn lt(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.push(column, Operator::Lt, value)
    }

    pub fn lte(&mut self, column: &str, value: impl Display) -> &mut Self {
        self.push(column, Operator::Lte, value)
    }

    pub fn like(&mut self, column: &str, pattern: &str) -> &mut Self {
        self.push(column, Operator::Like, pattern)
    }

    pub fn ilike(&mut self, column: &str, pattern: &str) -> &mut Self {
        self.push(column, Operator::Ilike, pattern)
    }

    pub fn is(&mut self, column: &str, value: IsValue) -> &mut Self {
        self.push(column, Operator::Is, value)
    }

    pub fn in_<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let literal = list_literal(values);
        self.push(column, Operator::In, literal)
    }

    pub fn contains(&mut self, column: &str, value: &Value) -> &mut Self {
        self.push(column, Operator::Contains, containment_literal(value))
    }

    pub fn contained_by(&mut self, column: &str, value: &Value) -> &mut Self {
        self.push(column, Operator::ContainedBy, containment_literal(value))
    }

    /// One `eq` per pair.
    pub fn match_<I, K, V>(&mut self, query: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        for (column, value) in query {
            self.push(column.as_ref(), Operator::Eq, value);
        }
        self
    }

    pub fn not(&mut self, column: &str, operator: Operator, value: impl Display) -> &mut Self {
        self.request.filters.push(Filter::Column {
            column: column.to_string(),
            operator: operator.as_str().to_string(),
            value: value.to_string(),
            negated: true,
        });
        self
    }

    pub fn or(&mut self, filters: &str) -> &mut Self {
        self.request.filters.push(Filter::Or(filters.to_string()));
        self
    }

    /// Escape hatch for operators without a dedicated method (`fts`, `ov`, ...).
    pub fn filter(&mut self, column: &str, operator: &str, value: impl Display) -> &mut Self {
        self.request.filters.push(Filter::Column {
            column: column.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
            negated: false,
        });
        self
    }

    // Shaping

    pub fn order(&mut self, column: &str, direction: Direction) -> &mut Self {
        self.request.orders.push(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn limit(&mut self, count: usize) -> &mut Self {
        self.request.limit = Some(count);
        self
    }

    pub fn offset(&mut self, count: usize) -> &mut Self {
        self.request.offset = Some(count);
        self
    }

    /// Inclusive row range, zero based. A range reaching `usize::MAX` keeps
    /// only the offset.
    pub fn range(&mut self, from: usize, to: usize) -> &mut Self {
        if to < from {
            return self.reject(format!("range end {} is before start {}", to, from));
        }
        self.request.offset = Some(from);
        self.request.limit = (to - from).checked_add(1);
        self
    }

    // Resolution

    async fn resolve(&self, cardinality: Cardinality) -> QueryResult<Value> {
        if let Some(reason) = &self.invalid {
            tracing::warn!("Rejected query on {:?}: {}", self.request.table, reason);
            return QueryResult::err(AppError::InvalidInput(reason.clone()));
        }
        let mut request = self.request.clone();
        request.cardinality = cardinality;
        tracing::debug!(
            "Resolving {:?} on {} ({} filters)",
            request.operation,
            request.table,
            request.filters.len()
        );
        self.backend.execute(request).await
    }

    /// Raw payload of the whole chain.
    pub async fn execute(&self) -> QueryResult<Value> {
        self.resolve(Cardinality::Many).await
    }

    pub async fn fetch<T: DeserializeOwned>(&self) -> QueryResult<Vec<T>> {
        self.resolve(Cardinality::Many).await.parse()
    }

    /// Exactly one row; `PGRST116` when there is none.
    pub async fn single<T: DeserializeOwned>(&self) -> QueryResult<T> {
        self.resolve(Cardinality::Single).await.parse()
    }

    /// Zero or one row; an empty result is `{data: None, error: None}`.
    pub async fn maybe_single<T: DeserializeOwned>(&self) -> QueryResult<T> {
        self.resolve(Cardinality::MaybeSingle).await.parse()
    }
}
