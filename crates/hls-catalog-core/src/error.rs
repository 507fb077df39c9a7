//! Error types for the catalog pipeline
//!
//! Only genuinely unexpected failures are errors. Outcomes such as "no
//! manifest in any script" or "playlist is not encrypted" are modelled as
//! `None` at the component boundary instead.

use thiserror::Error;

/// Error type for all catalog pipeline operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP request failed (network error, timeout, body read)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Browser backend could not be launched or crashed
    #[error("Browser failure: {0}")]
    Browser(String),

    /// A session could not be opened on the given URL
    #[error("Failed to open {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// A DOM query expected on a card or page found nothing usable
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// URL could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// An operation exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
