//! Storage-service overlay used when the catalog boundary is unreachable.

use reqwest::Client;
use tracing::debug;

use crate::error::ListingError;
use crate::models::{StorageFile, StorageFileList, VideoCollection};

pub struct StorageClient {
    client: Client,
    base_url: String,
    purpose: String,
}

impl StorageClient {
    pub fn new(client: Client, base_url: &str, purpose: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            purpose: purpose.into(),
        }
    }

    /// `GET /files?purpose=<purpose>`.
    pub async fn list_files(&self) -> Result<Vec<StorageFile>, ListingError> {
        let url = format!("{}/files", self.base_url);
        debug!("[storage] GET {} purpose={}", url, self.purpose);
        let response = self
            .client
            .get(&url)
            .query(&[("purpose", self.purpose.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ListingError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let list: StorageFileList =
            serde_json::from_slice(&bytes).map_err(|e| ListingError::Decode(e.to_string()))?;
        Ok(list.data)
    }
}

/// Sets `vss_id` on entries whose filename matches a stored file. Never adds
/// entries.
pub fn reconcile_fallback(mut collection: VideoCollection, files: Vec<StorageFile>) -> VideoCollection {
    for file in files {
        let Some(filename) = file.filename else {
            continue;
        };
        if file.id.is_empty() {
            continue;
        }
        if let Some(record) = collection.get_mut(&filename) {
            record.vss_id = Some(file.id);
        }
    }
    collection
}
