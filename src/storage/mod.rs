// Storage abstraction for Supabase Storage and the in-memory double

pub mod memory;
pub mod rest;

pub use memory::MemoryStorage;
pub use rest::RestStorage;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{ApiError, AppError};
use crate::query::QueryResult;

/// Object storage shared by Supabase Storage and the in-memory double.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Uploads `data` and returns the stored object path.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, ApiError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, ApiError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct StorageClient {
    backend: Arc<dyn StorageBackend>,
}

impl StorageClient {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn from(&self, bucket: &str) -> BucketHandle<'_> {
        BucketHandle {
            backend: self.backend.as_ref(),
            bucket: bucket.to_string(),
        }
    }
}

/// Operations on one bucket, each resolving to a result pair.
pub struct BucketHandle<'a> {
    backend: &'a dyn StorageBackend,
    bucket: String,
}

fn check_path(path: &str) -> Result<(), AppError> {
    if path.is_empty() || path.starts_with('/') {
        return Err(AppError::Storage(format!("invalid object path {:?}", path)));
    }
    Ok(())
}

impl BucketHandle<'_> {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn upload(
        &self,
        path: &str,
        data: impl Into<Bytes>,
        content_type: &str,
    ) -> QueryResult<String> {
        if let Err(e) = check_path(path) {
            return QueryResult::err(e);
        }
        self.backend
            .upload(&self.bucket, path, data.into(), content_type)
            .await
            .into()
    }

    pub async fn download(&self, path: &str) -> QueryResult<Bytes> {
        if let Err(e) = check_path(path) {
            return QueryResult::err(e);
        }
        self.backend.download(&self.bucket, path).await.into()
    }

    /// Resolves to `{data: None, error: None}` on success.
    pub async fn remove(&self, paths: &[&str]) -> QueryResult<()> {
        for path in paths {
            if let Err(e) = check_path(path) {
                return QueryResult::err(e);
            }
        }
        let paths: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        match self.backend.remove(&self.bucket, &paths).await {
            Ok(()) => QueryResult::empty(),
            Err(error) => QueryResult::err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_handle_against_memory_double() {
        let storage = StorageClient::new(Arc::new(MemoryStorage::new()));
        let bucket = storage.from("product-images");

        let uploaded = bucket
            .upload("products/7.png", vec![1u8, 2, 3], "image/png")
            .await;
        assert_eq!(uploaded, QueryResult::ok("products/7.png".to_string()));

        let downloaded = bucket.download("products/7.png").await;
        assert!(downloaded.error.is_none());
        assert!(downloaded.data.unwrap().is_empty());

        let removed = bucket.remove(&["products/7.png"]).await;
        assert_eq!(removed, QueryResult::empty());
    }

    #[tokio::test]
    async fn test_rejects_bad_paths() {
        let storage = StorageClient::new(Arc::new(MemoryStorage::new()));
        let bucket = storage.from("product-images");

        let result = bucket.upload("", Bytes::new(), "image/png").await;
        assert_eq!(result.error.unwrap().code, "storage_error");

        let result = bucket.remove(&["ok.png", "/abs.png"]).await;
        assert_eq!(result.error.unwrap().code, "storage_error");
    }
}
