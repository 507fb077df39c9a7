//! Encryption key declaration lookup in HLS playlist text
//!
//! Only the `#EXT-X-KEY:METHOD=AES-128,URI="..."` line matters here; the
//! rest of the playlist format is not parsed.

use std::sync::LazyLock;

use regex::Regex;

const KEY_PATTERN: &str = r#"#EXT-X-KEY:METHOD=AES-128,URI="([^"]+)""#;

static KEY_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(KEY_PATTERN).ok());

/// Returns the raw URI of the first AES-128 key declaration
///
/// # Arguments
/// * `playlist` - Body of an `.m3u8` document
///
/// # Returns
/// The URI exactly as written (possibly relative), or `None` for an
/// unencrypted playlist
pub fn find_key_uri(playlist: &str) -> Option<String> {
    let Some(re) = KEY_RE.as_ref() else {
        return None;
    };

    re.captures(playlist)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
