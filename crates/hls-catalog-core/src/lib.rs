//! HLS Catalog Core Library
//!
//! Crawls a video listing page and builds a catalog of the HLS streams
//! behind it.
//!
//! # Overview
//!
//! A run goes through four stages:
//! - [`ListingExtractor`] reads the rendered listing page into video stubs
//! - [`ManifestLocator`] opens each detail page and scans its inline scripts
//!   for an `.m3u8` manifest URL
//! - [`KeyResolver`] fetches the manifest and resolves its AES-128 key URI
//! - [`CatalogBuilder`] ties the stages together and keeps listing order
//!
//! Pages are rendered through a [`RenderedPageClient`], backed either by a
//! headless Chrome ([`ChromeRenderer`]) or by plain HTTP with static HTML
//! parsing ([`SnapshotRenderer`]).
//!
//! # Example
//!
//! ```no_run
//! use hls_catalog_core::{BrowserOptions, CatalogBuilder, CrawlConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = CrawlConfig::default();
//!     let builder = CatalogBuilder::chrome(BrowserOptions::default(), &config)?;
//!
//!     let catalog = builder.build("https://example.com/categories/drama/").await?;
//!     for entry in &catalog {
//!         println!("{} -> {:?} (key {:?})", entry.title, entry.manifest_url, entry.key_url);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Encryption keys
//!
//! Only the key's address is resolved. Key material is never downloaded and
//! segments are never decrypted.

pub mod browser;
mod catalog;
mod client;
pub mod config;
mod error;
mod key;
mod listing;
mod locator;
pub mod parser;
mod types;
pub mod url;

// Re-export page rendering types
pub use browser::{ChromeRenderer, RenderedPageClient, Session, SnapshotRenderer};

// Re-export pipeline components
pub use catalog::CatalogBuilder;
pub use key::KeyResolver;
pub use listing::{ListingExtractor, ListingSelectors};
pub use locator::ManifestLocator;

// Re-export client and configuration
pub use client::HttpClient;
pub use config::{BrowserOptions, CrawlConfig, HttpConfig, ReadyCondition};

// Re-export error types
pub use error::{CatalogError, Result};

// Re-export data types
pub use types::{Catalog, CatalogEntry, StreamInfo, VideoStub};
