use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, AppError};

/// `{data, error}` outcome of every terminal operation.
///
/// Every pair this crate returns comes from the constructors below, so a
/// present `error` always comes with `data: None`. The fields stay public for
/// reading; building a pair by hand skips that guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> QueryResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    pub fn err(error: impl Into<ApiError>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        QueryResult {
            data: self.data.map(f),
            error: self.error,
        }
    }

    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

impl<T> From<Result<T, ApiError>> for QueryResult<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => QueryResult::ok(data),
            Err(error) => QueryResult::err(error),
        }
    }
}

impl QueryResult<Value> {
    /// Deserializes the raw payload. `null` stays `data: None`; a payload that
    /// does not fit `T` becomes a `parse_error`.
    pub fn parse<T: DeserializeOwned>(self) -> QueryResult<T> {
        if let Some(error) = self.error {
            return QueryResult::err(error);
        }
        match self.data {
            None | Some(Value::Null) => QueryResult::empty(),
            Some(value) => match serde_json::from_value(value) {
                Ok(data) => QueryResult::ok(data),
                Err(e) => {
                    tracing::warn!("Failed to parse query payload: {}", e);
                    QueryResult::err(AppError::from(e))
                }
            },
        }
    }
}
