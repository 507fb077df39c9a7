//! Core data types for the catalog pipeline
//!
//! Contains the records passed between the listing, resolution and
//! persistence stages.

use serde::{Deserialize, Serialize};

/// A listing card parsed before stream resolution
///
/// Created once per listing item and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStub {
    /// Thumbnail URL (lazy-load attribute preferred over `src`)
    pub image_url: Option<String>,

    /// Trimmed title text of the card link
    pub title: String,

    /// Absolute URL of the video detail page
    pub detail_url: String,
}

/// Streaming metadata resolved for one video
///
/// `key_url` is only meaningful when `manifest_url` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// HLS manifest URL found in the detail page scripts
    pub manifest_url: Option<String>,

    /// Absolute URL of the AES-128 key declared by the manifest
    pub key_url: Option<String>,
}

impl StreamInfo {
    /// Stream info for a page without any manifest reference
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Stream info for a manifest whose key could not be resolved
    pub fn manifest_only(manifest_url: impl Into<String>) -> Self {
        Self {
            manifest_url: Some(manifest_url.into()),
            key_url: None,
        }
    }
}

/// One row of the output catalog
///
/// Serializes as `{ img_url, title, detail_url, video, key_url }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "img_url")]
    pub image_url: Option<String>,

    pub title: String,

    pub detail_url: String,

    /// Manifest URL
    #[serde(rename = "video")]
    pub manifest_url: Option<String>,

    pub key_url: Option<String>,
}

impl CatalogEntry {
    /// Merges a listing stub with its resolved stream info
    pub fn merge(stub: VideoStub, stream: StreamInfo) -> Self {
        Self {
            image_url: stub.image_url,
            title: stub.title,
            detail_url: stub.detail_url,
            manifest_url: stream.manifest_url,
            key_url: stream.key_url,
        }
    }
}

/// Ordered catalog of one run, in listing page order
pub type Catalog = Vec<CatalogEntry>;
