//! Client of the catalog boundary, as used by the clip page.
//!
//! A non-2xx answer is reported to the caller so it can alert the user. A
//! call that fails outright (unreachable, undecodable) triggers the storage
//! fallback, which is silent on failure.

use chrono::{SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::error::ListingError;
use crate::fallback::{reconcile_fallback, StorageClient};
use crate::models::{VideoCollection, VideoRecord};

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(VideoCollection),
    /// The boundary answered with an error status.
    Rejected { status: StatusCode, body: String },
    /// The boundary call failed and the storage overlay succeeded.
    Fallback(VideoCollection),
    /// Both the boundary call and the fallback failed.
    Unavailable,
}

impl LoadOutcome {
    pub fn alert_message(&self) -> Option<String> {
        match self {
            LoadOutcome::Rejected { status, .. } => Some(format!(
                "Failed to load videos: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()),
            _ => None,
        }
    }

    pub fn collection(&self) -> Option<&VideoCollection> {
        match self {
            LoadOutcome::Loaded(c) | LoadOutcome::Fallback(c) => Some(c),
            _ => None,
        }
    }
}

enum FetchError {
    Rejected { status: StatusCode, body: String },
    Failed(ListingError),
}

pub struct ClipLoader {
    client: Client,
    api_base_url: String,
    storage: Option<StorageClient>,
}

impl ClipLoader {
    pub fn new(client: Client, api_base_url: &str, storage: Option<StorageClient>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            storage,
        }
    }

    async fn fetch_collection(&self) -> Result<VideoCollection, FetchError> {
        let url = format!("{}/api/video", self.api_base_url);
        let response = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Failed(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Rejected { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Failed(e.into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| FetchError::Failed(ListingError::Decode(e.to_string())))
    }

    pub async fn load(&self) -> LoadOutcome {
        info!("[loader] Loading clip data");

        match self.fetch_collection().await {
            Ok(collection) => LoadOutcome::Loaded(collection),
            Err(FetchError::Rejected { status, body }) => {
                error!("[loader] Failed to load clip data: {} {}", status, body);
                LoadOutcome::Rejected { status, body }
            }
            Err(FetchError::Failed(e)) => {
                error!("[loader] Error loading clip data: {}", e);
                self.load_with_fallback().await
            }
        }
    }

    async fn load_with_fallback(&self) -> LoadOutcome {
        let Some(storage) = &self.storage else {
            return LoadOutcome::Unavailable;
        };

        info!("[loader] Attempting to load from storage as fallback");
        let files = match storage.list_files().await {
            Ok(files) => files,
            Err(e) => {
                warn!("[loader] Storage fallback failed: {}", e);
                return LoadOutcome::Unavailable;
            }
        };

        match self.fetch_collection().await {
            Ok(collection) => LoadOutcome::Fallback(reconcile_fallback(collection, files)),
            Err(FetchError::Rejected { status, .. }) => {
                warn!("[loader] Catalog re-fetch rejected during fallback: {}", status);
                LoadOutcome::Unavailable
            }
            Err(FetchError::Failed(e)) => {
                warn!("[loader] Catalog re-fetch failed during fallback: {}", e);
                LoadOutcome::Unavailable
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClipHls {
    pub video_url: String,
    pub thumbnail_urls: Vec<String>,
}

/// Card view of a merged record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Clip {
    pub id: String,
    #[serde(rename = "pegasusId")]
    pub pegasus_id: String,
    pub filename: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub duration: f64,
    pub video_url: String,
    pub thumbnail_url: String,
    pub vss_id: String,
    #[serde(rename = "searchScore", skip_serializing_if = "Option::is_none")]
    pub search_score: Option<Value>,
    #[serde(rename = "searchConfidence", skip_serializing_if = "Option::is_none")]
    pub search_confidence: Option<Value>,
    pub hls: ClipHls,
}

fn str_at<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    current.get(*last)?.as_str().filter(|s| !s.is_empty())
}

fn first_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)?
        .as_array()?
        .first()?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<&VideoRecord> for Clip {
    fn from(record: &VideoRecord) -> Self {
        let meta = &record.metadata;
        let id = Some(record.id.as_str())
            .filter(|id| !id.is_empty())
            .or(record.pegasus_id.as_deref())
            .unwrap_or_default()
            .to_string();
        let pegasus_id = record.pegasus_id.clone().unwrap_or_else(|| record.id.clone());

        let filename = Some(record.filename.as_str())
            .filter(|name| !name.is_empty())
            .or_else(|| str_at(meta, &["systemMetadata", "filename"]))
            .unwrap_or("Unknown")
            .to_string();

        // Records without a timestamp are stamped at conversion time.
        let created_at = str_at(meta, &["createdAt"])
            .or_else(|| str_at(meta, &["created_at"]))
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        let duration = meta
            .get("duration")
            .and_then(Value::as_f64)
            .filter(|d| *d != 0.0)
            .or_else(|| {
                meta.get("metadata")
                    .and_then(|m| m.get("duration"))
                    .and_then(Value::as_f64)
            })
            .unwrap_or(0.0);

        let video_url = str_at(meta, &["video_url"])
            .or_else(|| str_at(meta, &["hls", "video_url"]))
            .unwrap_or_default()
            .to_string();

        let thumbnail_url = str_at(meta, &["thumbnail_url"])
            .map(str::to_string)
            .or_else(|| meta.get("hls").and_then(Value::as_object).and_then(|hls| first_str(hls, "thumbnail_urls")))
            .or_else(|| first_str(meta, "thumbnail_urls"))
            .unwrap_or_default();

        let hls = match meta.get("hls").and_then(Value::as_object) {
            Some(hls) => ClipHls {
                video_url: str_at(hls, &["video_url"]).unwrap_or_default().to_string(),
                thumbnail_urls: hls
                    .get("thumbnail_urls")
                    .and_then(Value::as_array)
                    .map(|urls| urls.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default(),
            },
            None => ClipHls {
                video_url: str_at(meta, &["video_url"]).unwrap_or_default().to_string(),
                thumbnail_urls: match meta.get("thumbnail_urls").and_then(Value::as_array) {
                    Some(urls) => urls.iter().filter_map(Value::as_str).map(str::to_string).collect(),
                    None => vec![str_at(meta, &["thumbnail_url"]).unwrap_or_default().to_string()],
                },
            },
        };

        let vss_id = record.vss_id.clone().unwrap_or_else(|| id.clone());

        Self {
            id,
            pegasus_id,
            filename,
            created_at,
            duration,
            video_url,
            thumbnail_url,
            vss_id,
            search_score: meta.get("searchScore").filter(|v| !v.is_null()).cloned(),
            search_confidence: meta.get("searchConfidence").filter(|v| !v.is_null()).cloned(),
            hls,
        }
    }
}

pub fn clips(collection: &VideoCollection) -> Vec<Clip> {
    collection.values().map(Clip::from).collect()
}
