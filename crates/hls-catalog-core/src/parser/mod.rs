//! Pattern extractors for script and playlist text
//!
//! Contains modules for the two kinds of text the pipeline scans.

pub mod manifest;
pub mod playlist;

pub use manifest::{find_manifest_url, mentions_manifest};
pub use playlist::find_key_uri;
