use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult};

/// Shared reqwest client carrying the project key and the signed-in user's token.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    api_key: String,
    schema: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.supabase_anon_key.is_empty() {
            return Err(AppError::Config("SUPABASE_ANON_KEY is empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.supabase_anon_key.clone(),
            schema: config.schema.clone(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|guard| guard.clone())
    }

    /// Starts a request with `apikey` and bearer headers. The bearer falls back
    /// to the anon key while nobody is signed in.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.api_key.clone());
        self.request_as(method, url, &bearer)
    }

    pub fn request_as(&self, method: Method, url: &str, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Bytes, ApiError> {
        let response = builder.send().await.map_err(AppError::from)?;
        let status = response.status();
        let body = response.bytes().await.map_err(AppError::from)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(error_from_body(status, &body))
        }
    }

    /// Like [`send`](Self::send) but parses the body; an empty body is `null`.
    pub async fn send_json(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let body = self.send(builder).await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| AppError::from(e).into())
    }
}

#[derive(Deserialize)]
struct GoTrueError {
    msg: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
    error: Option<String>,
}

/// Reads PostgREST, Storage and GoTrue error bodies into one shape.
pub(crate) fn error_from_body(status: StatusCode, body: &[u8]) -> ApiError {
    if let Ok(mut err) = serde_json::from_slice::<ApiError>(body) {
        if err.code.is_empty() {
            err.code = status.as_u16().to_string();
        }
        return err;
    }
    if let Ok(err) = serde_json::from_slice::<GoTrueError>(body) {
        if let Some(message) = err.msg.or(err.error_description) {
            let code = err
                .error_code
                .or(err.error)
                .unwrap_or_else(|| status.as_u16().to_string());
            return ApiError::new(code, message);
        }
    }
    let text = String::from_utf8_lossy(body);
    let message = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        text.into_owned()
    };
    ApiError::new(status.as_u16().to_string(), message)
}
