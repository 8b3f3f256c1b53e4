use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::twelvelabs::VideoListing;

/// Keys owned by `VideoRecord` itself; never kept in the passthrough map.
const RESERVED_KEYS: [&str; 4] = ["id", "pegasusId", "filename", "vss_id"];

/// Accepts a string or a number; anything else (or absence) decodes to an
/// empty id so one malformed item does not fail its whole page.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => id,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// One video as returned by a listing page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVideo {
    #[serde(alias = "_id", default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(
        rename = "systemMetadata",
        alias = "system_metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub system_metadata: Option<Map<String, Value>>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawVideo {
    /// System-metadata filename, then the record's own filename, then
    /// `video_<id>`. Empty strings are skipped.
    pub fn resolved_filename(&self) -> String {
        self.system_metadata
            .as_ref()
            .and_then(|meta| meta.get("filename"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .or_else(|| self.filename.as_deref().filter(|name| !name.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("video_{}", self.id))
    }

    /// Builds the merged record: passthrough fields, the nested system
    /// metadata, its fields spread on top, then id and filename.
    pub fn into_record(self) -> VideoRecord {
        let filename = self.resolved_filename();
        let mut metadata = self.extra;

        if let Some(system) = self.system_metadata {
            metadata.insert("systemMetadata".to_string(), Value::Object(system.clone()));
            metadata.extend(system);
        }
        for key in RESERVED_KEYS {
            metadata.remove(key);
        }

        VideoRecord {
            id: self.id,
            pegasus_id: None,
            filename,
            vss_id: None,
            metadata,
        }
    }
}

/// A video after reconciliation across listings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    #[serde(rename = "pegasusId", default, skip_serializing_if = "Option::is_none")]
    pub pegasus_id: Option<String>,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vss_id: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Filename to record, one entry per distinct filename.
pub type VideoCollection = BTreeMap<String, VideoRecord>;

/// A stored file as listed by the storage service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageFile {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageFileList {
    #[serde(default)]
    pub data: Vec<StorageFile>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub listing: Arc<dyn VideoListing>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawVideo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn system_metadata_filename_wins() {
        let video = raw(json!({
            "id": "7",
            "systemMetadata": { "filename": "a.mp4" },
            "filename": "b.mp4"
        }));
        assert_eq!(video.resolved_filename(), "a.mp4");
    }

    #[test]
    fn top_level_filename_used_when_metadata_has_none() {
        let video = raw(json!({ "id": "7", "systemMetadata": { "duration": 3.0 }, "filename": "b.mp4" }));
        assert_eq!(video.resolved_filename(), "b.mp4");
    }

    #[test]
    fn filename_synthesized_from_id() {
        let video = raw(json!({ "id": "42" }));
        assert_eq!(video.resolved_filename(), "video_42");
    }

    #[test]
    fn empty_filenames_fall_through() {
        let video = raw(json!({ "id": "42", "systemMetadata": { "filename": "" }, "filename": "" }));
        assert_eq!(video.resolved_filename(), "video_42");
    }

    #[test]
    fn accepts_wire_field_names() {
        let video = raw(json!({
            "_id": "abc",
            "system_metadata": { "filename": "clip.mp4", "duration": 12.5 },
            "created_at": "2024-01-01T00:00:00Z"
        }));
        assert_eq!(video.id, "abc");
        assert_eq!(video.resolved_filename(), "clip.mp4");
        assert_eq!(video.extra["created_at"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn record_spreads_system_metadata_without_duplicate_keys() {
        let record = raw(json!({
            "id": "1",
            "systemMetadata": { "filename": "x.mp4", "duration": 9.0, "id": "shadow" },
            "hls": { "video_url": "https://cdn/x.m3u8" }
        }))
        .into_record();

        assert_eq!(record.id, "1");
        assert_eq!(record.filename, "x.mp4");
        assert_eq!(record.metadata["duration"], json!(9.0));
        assert_eq!(record.metadata["systemMetadata"]["filename"], json!("x.mp4"));
        assert!(record.metadata.get("id").is_none());
        assert!(record.metadata.get("filename").is_none());

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["id"], json!("1"));
        assert_eq!(out["hls"]["video_url"], json!("https://cdn/x.m3u8"));
        assert!(out.get("pegasusId").is_none());
    }

    #[test]
    fn malformed_ids_decode_without_failing_the_page() {
        #[derive(Deserialize)]
        struct Page {
            data: Vec<RawVideo>,
        }

        let page: Page = serde_json::from_value(json!({
            "data": [
                { "system_metadata": { "filename": "no-id.mp4" } },
                { "_id": 17, "filename": 5 },
                { "_id": "ok", "filename": "ok.mp4" }
            ]
        }))
        .unwrap();

        assert_eq!(page.data.len(), 3);
        assert_eq!(page.data[0].id, "");
        assert_eq!(page.data[1].id, "17");
        assert_eq!(page.data[1].filename, None);
        assert_eq!(page.data[2].resolved_filename(), "ok.mp4");
    }

    #[test]
    fn storage_file_without_id_still_decodes() {
        let list: StorageFileList = serde_json::from_value(json!({
            "data": [{ "filename": "a.mp4" }, { "id": "f2", "filename": "b.mp4" }]
        }))
        .unwrap();

        assert_eq!(list.data.len(), 2);
        assert!(list.data[0].id.is_empty());
        assert_eq!(list.data[1].id, "f2");
    }

    #[test]
    fn storage_list_without_data_is_empty() {
        let list: StorageFileList = serde_json::from_str("{}").unwrap();
        assert!(list.data.is_empty());
    }
}
