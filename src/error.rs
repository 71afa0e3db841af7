use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error half of a result pair, shaped like PostgREST / GoTrue error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
            hint: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ApiError {}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown {field} value: {value:?}")]
    UnknownTag { field: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Http(_) => "http_error",
            AppError::Json(_) => "parse_error",
            AppError::InvalidInput(_) => "invalid_request",
            AppError::UnknownTag { .. } => "unknown_tag",
            AppError::Config(_) => "config_error",
            AppError::Storage(_) => "storage_error",
            AppError::Token(_) => "token_error",
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let api = ApiError::new(err.code(), err.to_string());
        match err {
            AppError::UnknownTag { field, .. } => api.with_hint(format!("check the {} column", field)),
            _ => api,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_error_body() {
        let body = r#"{"code":"23505","details":"Key (code)=(A1) already exists.","hint":null,"message":"duplicate key value violates unique constraint"}"#;
        let err: ApiError = serde_json::from_str(body).unwrap();
        assert_eq!(err.code, "23505");
        assert_eq!(err.details.as_deref(), Some("Key (code)=(A1) already exists."));
        assert!(err.hint.is_none());
    }

    #[test]
    fn test_app_error_codes() {
        let err: ApiError = AppError::UnknownTag {
            field: "role",
            value: "owner".to_string(),
        }
        .into();
        assert_eq!(err.code, "unknown_tag");
        assert!(err.message.contains("owner"));
        assert!(err.hint.is_some());

        let err: ApiError = AppError::InvalidInput("empty table name".to_string()).into();
        assert_eq!(err.code, "invalid_request");
    }
}
