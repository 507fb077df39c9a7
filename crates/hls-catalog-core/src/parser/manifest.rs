//! Manifest reference extraction from inline script text
//!
//! A detail page embeds its HLS playlist URL somewhere inside an inline
//! `<script>`. The scan is two-step: a cheap substring probe, then the
//! anchored URL pattern only on scripts that passed the probe.

use std::sync::LazyLock;

use regex::Regex;

/// Substring every manifest reference contains
pub const MANIFEST_MARKER: &str = ".m3u8";

const MANIFEST_PATTERN: &str = r#"(https?://[^'"\s]+\.m3u8)"#;

static MANIFEST_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(MANIFEST_PATTERN).ok());

/// Cheap check whether a script could contain a manifest URL at all
pub fn mentions_manifest(script: &str) -> bool {
    script.contains(MANIFEST_MARKER)
}

/// Returns the first absolute `http(s)` manifest URL in `script`
///
/// Callers scanning many scripts should gate this on [`mentions_manifest`].
///
/// # Arguments
/// * `script` - Raw text of one inline script element
///
/// # Returns
/// `Some(url)` for the first match in text order, `None` if the script has
/// no manifest reference
pub fn find_manifest_url(script: &str) -> Option<String> {
    let Some(re) = MANIFEST_RE.as_ref() else {
        return None;
    };

    re.captures(script)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
