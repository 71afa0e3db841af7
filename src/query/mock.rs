use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

use super::{Cardinality, DataBackend, QueryRequest, QueryResult};

/// In-memory stand-in for PostgREST.
///
/// Filters, ordering and limits are accepted and logged but never applied:
/// every resolution sees the full backing collection of its table. Inserts,
/// updates and deletes do not touch the collections either; tests that need
/// to see a write assert on [`MockBackend::requests`] instead.
#[derive(Default)]
pub struct MockBackend {
    tables: HashMap<String, Arc<Vec<Value>>>,
    requests: Mutex<Vec<QueryRequest>>,
    rpc_calls: Mutex<Vec<(String, Value)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.insert(table.to_string(), Arc::new(rows));
        self
    }

    pub fn with_records<T: Serialize>(
        self,
        table: &str,
        records: &[T],
    ) -> Result<Self, serde_json::Error> {
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.with_table(table, rows))
    }

    /// Backing collection of `table`; unknown tables are empty.
    pub fn rows(&self, table: &str) -> Arc<Vec<Value>> {
        self.tables.get(table).cloned().unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn rpc_calls(&self) -> Vec<(String, Value)> {
        self.rpc_calls
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

fn no_rows(table: &str) -> ApiError {
    ApiError::new(
        "PGRST116",
        "JSON object requested, multiple (or no) rows returned",
    )
    .with_details(format!("The result contains 0 rows (table {})", table))
}

#[async_trait]
impl DataBackend for MockBackend {
    async fn execute(&self, request: QueryRequest) -> QueryResult<Value> {
        let rows = self.rows(&request.table);
        let table = request.table.clone();
        let cardinality = request.cardinality;
        if let Ok(mut log) = self.requests.lock() {
            log.push(request);
        }

        match cardinality {
            Cardinality::Many => QueryResult::ok(Value::Array(rows.as_ref().clone())),
            Cardinality::Single => match rows.first() {
                Some(row) => QueryResult::ok(row.clone()),
                None => QueryResult::err(no_rows(&table)),
            },
            Cardinality::MaybeSingle => match rows.first() {
                Some(row) => QueryResult::ok(row.clone()),
                None => QueryResult::empty(),
            },
        }
    }

    async fn rpc(&self, function: &str, args: Value) -> QueryResult<Value> {
        if let Ok(mut log) = self.rpc_calls.lock() {
            log.push((function.to_string(), args));
        }
        QueryResult::empty()
    }
}
