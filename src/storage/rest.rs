use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::json;

use crate::error::ApiError;
use crate::http_client::HttpClient;

use super::StorageBackend;

/// Supabase Storage API (`{project}/storage/v1`).
#[derive(Clone)]
pub struct RestStorage {
    http: HttpClient,
    storage_url: String,
}

impl RestStorage {
    pub fn new(http: HttpClient, storage_url: String) -> Self {
        Self { http, storage_url }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.storage_url,
            urlencoding::encode(bucket),
            encode_path(path)
        )
    }
}

/// Percent-encodes each segment, keeping the separators.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl StorageBackend for RestStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, ApiError> {
        let size = data.len();
        let builder = self
            .http
            .request(Method::POST, &self.object_url(bucket, path))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(data);
        self.http.send(builder).await?;

        tracing::info!(
            "Storage upload: bucket={}, path={}, size={}",
            bucket,
            path,
            size
        );
        Ok(path.to_string())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Bytes, ApiError> {
        let builder = self
            .http
            .request(Method::GET, &self.object_url(bucket, path));
        let data = self.http.send(builder).await?;

        tracing::info!(
            "Storage download: bucket={}, path={}, size={}",
            bucket,
            path,
            data.len()
        );
        Ok(data)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), ApiError> {
        let url = format!(
            "{}/object/{}",
            self.storage_url,
            urlencoding::encode(bucket)
        );
        let builder = self
            .http
            .request(Method::DELETE, &url)
            .json(&json!({ "prefixes": paths }));
        self.http.send(builder).await?;

        tracing::info!("Storage remove: bucket={}, paths={:?}", bucket, paths);
        Ok(())
    }
}
