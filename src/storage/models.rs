use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for a Google Cloud Storage object, as delivered by Storage events.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub kind: Option<String>,
    pub id: Option<String>,
    pub self_link: Option<String>,
    pub name: Option<String>,
    pub bucket: Option<String>,
    pub generation: Option<String>,
    pub metageneration: Option<String>,
    pub content_type: Option<String>,
    pub time_created: Option<String>,
    pub updated: Option<String>,
    pub time_deleted: Option<String>,
    pub time_storage_class_updated: Option<String>,
    pub storage_class: Option<String>,
    pub size: Option<String>,
    pub md5_hash: Option<String>,
    pub media_link: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub cache_control: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    pub crc32c: Option<String>,
    pub component_count: Option<u32>,
    pub etag: Option<String>,
}

impl ObjectMetadata {
    /// The object size in bytes, when present and well-formed.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }

    /// `true` once the object has been deleted or overwritten.
    pub fn is_deleted(&self) -> bool {
        self.time_deleted.is_some()
    }
}
