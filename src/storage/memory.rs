use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ApiError;

use super::StorageBackend;

/// Storage double: every call succeeds and nothing is kept. Downloads
/// resolve to an empty blob.
#[derive(Debug, Default)]
pub struct MemoryStorage;

impl MemoryStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, ApiError> {
        tracing::info!(
            "Mock upload: bucket={}, path={}, size={}",
            bucket,
            path,
            data.len()
        );
        Ok(path.to_string())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, ApiError> {
        tracing::info!("Mock download: bucket={}, path={}", bucket, path);
        Ok(Bytes::new())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ApiError> {
        tracing::info!("Mock remove: bucket={}, paths={:?}", bucket, paths);
        Ok(())
    }
}
