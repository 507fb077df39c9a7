//! URL helper functions
//!
//! Reference resolution follows WHATWG URL semantics through the `url`
//! crate, never string concatenation.

use url::Url;

use crate::error::{CatalogError, Result};

/// Checks whether a reference already carries a scheme
///
/// # Example
/// ```
/// use hls_catalog_core::url::is_absolute;
/// assert!(is_absolute("https://cdn.example.com/a.key"));
/// assert!(!is_absolute("/keys/a.key"));
/// assert!(!is_absolute("a.key"));
/// ```
pub fn is_absolute(reference: &str) -> bool {
    Url::parse(reference.trim()).is_ok()
}

/// Resolves `reference` against `base`
///
/// Absolute references are returned unchanged (apart from trimming).
///
/// # Arguments
/// * `base` - Absolute URL of the document the reference appeared in
/// * `reference` - Absolute or relative reference
///
/// # Errors
/// Returns `InvalidUrl` if `base` is not absolute or the join fails
///
/// # Example
/// ```
/// use hls_catalog_core::url::resolve;
/// let url = resolve("https://cdn.example.com/stream/index.m3u8", "/keys/a.key").unwrap();
/// assert_eq!(url, "https://cdn.example.com/keys/a.key");
/// ```
pub fn resolve(base: &str, reference: &str) -> Result<String> {
    let reference = reference.trim();
    if is_absolute(reference) {
        return Ok(reference.to_string());
    }

    let base = Url::parse(base).map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", base, e)))?;
    base.join(reference)
        .map(String::from)
        .map_err(|e| CatalogError::InvalidUrl(format!("{} against {}: {}", reference, base, e)))
}

/// Resolves an optional attribute value, treating empty values as absent
pub fn resolve_optional(base: &str, reference: Option<&str>) -> Option<String> {
    let reference = reference.map(str::trim).filter(|r| !r.is_empty())?;
    resolve(base, reference).ok()
}
