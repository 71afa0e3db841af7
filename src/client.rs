use std::sync::Arc;

use serde_json::Value;

use crate::auth::{mock::MOCK_EMAIL, AuthBackend, AuthClient, MockAuth, RestAuth};
use crate::config::Config;
use crate::error::AppResult;
use crate::http_client::HttpClient;
use crate::query::{DataBackend, MockBackend, QueryBuilder, QueryResult, RestBackend};
use crate::storage::{MemoryStorage, RestStorage, StorageBackend, StorageClient};

/// Entry point: table handles, RPC, auth and storage behind one value.
///
/// Production and test clients differ only in the backends they were built
/// with, so code written against `DataClient` runs unchanged on either.
#[derive(Clone)]
pub struct DataClient {
    backend: Arc<dyn DataBackend>,
    auth: AuthClient,
    storage: StorageClient,
}

impl DataClient {
    pub fn new(
        backend: Arc<dyn DataBackend>,
        auth: Arc<dyn AuthBackend>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            backend,
            auth: AuthClient::new(auth, None),
            storage: StorageClient::new(storage),
        }
    }

    pub fn connect(config: &Config) -> AppResult<Self> {
        let http = HttpClient::new(config)?;
        tracing::info!("Connecting to Supabase at {}", config.supabase_url);
        Ok(Self::new(
            Arc::new(RestBackend::new(http.clone(), config.rest_url())),
            Arc::new(RestAuth::new(http.clone(), config.auth_url())),
            Arc::new(RestStorage::new(http, config.storage_url())),
        ))
    }

    /// Client over the in-memory doubles, already signed in as the mock user.
    pub fn mock(backend: Arc<MockBackend>) -> Self {
        let auth = MockAuth::new();
        let session = match auth.session_for(MOCK_EMAIL) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Mock session unavailable: {}", e);
                None
            }
        };
        Self {
            backend,
            auth: AuthClient::new(Arc::new(auth), session),
            storage: StorageClient::new(Arc::new(MemoryStorage::new())),
        }
    }

    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.backend.clone(), table)
    }

    pub async fn rpc(&self, function: &str, args: Value) -> QueryResult<Value> {
        if function.is_empty() {
            return QueryResult::err(crate::error::AppError::InvalidInput(
                "function name must not be empty".to_string(),
            ));
        }
        self.backend.rpc(function, args).await
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_builds_rest_client() {
        let config = Config::new("https://abc.supabase.co", "anon");
        assert!(DataClient::connect(&config).is_ok());

        let config = Config::new("https://abc.supabase.co", "");
        assert!(DataClient::connect(&config).is_err());
    }

    #[tokio::test]
    async fn test_rpc_rejects_empty_name() {
        let client = DataClient::mock(Arc::new(MockBackend::new()));
        let result = client.rpc("", Value::Null).await;
        assert_eq!(result.error.unwrap().code, "invalid_request");
    }
}
