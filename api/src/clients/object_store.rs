//! HTTP-backed object store for citation documents.
//!
//! Bucket and key map onto the path of a JSON document service. One
//! attempt per fetch; the resolver treats any failure as "source
//! unusable" and moves on.

use palisade_core::citations::{ObjectStore, ObjectStoreError};
use serde_json::Value;

pub struct HttpObjectStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch_json(&self, bucket: &str, key: &str) -> Result<Value, ObjectStoreError> {
        let response = self
            .client
            .get(format!("{}/{}/{}", self.base_url, bucket, key))
            .send()
            .await
            .map_err(|err| ObjectStoreError::Unavailable(err.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        let response = response
            .error_for_status()
            .map_err(|err| ObjectStoreError::Unavailable(err.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|err| ObjectStoreError::InvalidBody(err.to_string()))
    }
}
