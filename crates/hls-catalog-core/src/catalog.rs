//! Catalog pipeline
//!
//! Combines listing extraction, manifest lookup and key resolution into one
//! run that yields an ordered [`Catalog`].

use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tokio::time::{Instant, timeout_at};
use tracing::{info, instrument, warn};

use crate::browser::{ChromeRenderer, RenderedPageClient, SnapshotRenderer};
use crate::client::HttpClient;
use crate::config::{BrowserOptions, CrawlConfig};
use crate::error::Result;
use crate::key::KeyResolver;
use crate::listing::ListingExtractor;
use crate::locator::ManifestLocator;
use crate::types::{Catalog, CatalogEntry, StreamInfo, VideoStub};

/// Builds a catalog from one listing page
///
/// A stub whose detail page cannot be resolved is logged and left out of
/// the catalog; only a failure to read the listing page aborts the run.
///
/// # Example
/// ```no_run
/// # async fn example() -> hls_catalog_core::Result<()> {
/// use hls_catalog_core::{BrowserOptions, CatalogBuilder, CrawlConfig};
///
/// let builder = CatalogBuilder::chrome(BrowserOptions::default(), &CrawlConfig::default())?;
/// let catalog = builder.build("https://example.com/categories/drama/").await?;
/// for entry in &catalog {
///     println!("{}: {:?}", entry.title, entry.manifest_url);
/// }
/// # Ok(())
/// # }
/// ```
pub struct CatalogBuilder {
    listing: ListingExtractor,
    locator: ManifestLocator,
    keys: KeyResolver,
    max_count: usize,
    concurrency: usize,
    item_timeout: Option<Duration>,
}

impl CatalogBuilder {
    /// Create a builder whose listing and detail sessions go through `pages`
    ///
    /// # Errors
    /// Returns error if the manifest HTTP client cannot be built
    pub fn new(pages: RenderedPageClient, config: &CrawlConfig) -> Result<Self> {
        let listing = ListingExtractor::new(pages.clone(), config.listing_ready.clone());
        let locator = ManifestLocator::new(pages, config.detail_ready.clone());
        let keys = KeyResolver::with_config(&config.http)?;
        Ok(Self::from_parts(listing, locator, keys, config))
    }

    /// Builder rendering pages in headless Chrome
    pub fn chrome(options: BrowserOptions, config: &CrawlConfig) -> Result<Self> {
        Self::new(RenderedPageClient::new(ChromeRenderer::new(options)), config)
    }

    /// Builder reading raw HTML without running page scripts
    pub fn snapshot(config: &CrawlConfig) -> Result<Self> {
        let client = HttpClient::with_config(&config.http)?;
        Self::new(RenderedPageClient::new(SnapshotRenderer::new(client)), config)
    }

    /// Assemble a builder from already configured components
    pub fn from_parts(
        listing: ListingExtractor,
        locator: ManifestLocator,
        keys: KeyResolver,
        config: &CrawlConfig,
    ) -> Self {
        Self {
            listing,
            locator,
            keys,
            max_count: config.max_count,
            concurrency: config.concurrency.max(1),
            item_timeout: config.item_timeout,
        }
    }

    /// Run the whole pipeline against `listing_url`
    ///
    /// # Returns
    /// Entries in listing order, at most `max_count` of them, without the
    /// stubs whose resolution failed
    ///
    /// # Errors
    /// Only failures to open or query the listing page itself
    #[instrument(skip(self))]
    pub async fn build(&self, listing_url: &str) -> Result<Catalog> {
        let stubs = self.listing.extract(listing_url, self.max_count).await?;
        let total = stubs.len();
        info!(stubs = total, "Listing extracted");

        let mut slots: Vec<Option<CatalogEntry>> = vec![None; total];
        let mut resolved = stream::iter(stubs.into_iter().enumerate())
            .map(|(index, stub)| async move { (index, self.resolve_entry(stub).await) })
            .buffer_unordered(self.concurrency);

        while let Some((index, entry)) = resolved.next().await {
            slots[index] = entry;
        }

        let catalog: Catalog = slots.into_iter().flatten().collect();
        info!(
            entries = catalog.len(),
            skipped = total - catalog.len(),
            "Catalog built"
        );
        Ok(catalog)
    }

    /// Locate the manifest for one detail page and, if found, its key
    ///
    /// # Returns
    /// [`StreamInfo::not_found`] when the page embeds no manifest
    ///
    /// # Errors
    /// Session failures from the locator
    pub async fn resolve_stream(&self, detail_url: &str) -> Result<StreamInfo> {
        self.resolve_stream_until(detail_url, None).await
    }

    async fn resolve_stream_until(
        &self,
        detail_url: &str,
        deadline: Option<Instant>,
    ) -> Result<StreamInfo> {
        let Some(manifest_url) = self.locator.locate_until(detail_url, deadline).await? else {
            return Ok(StreamInfo::not_found());
        };

        let Some(deadline) = deadline else {
            return Ok(self.keys.resolve(&manifest_url).await);
        };
        match timeout_at(deadline, self.keys.resolve(&manifest_url)).await {
            Ok(stream) => Ok(stream),
            Err(_) => {
                warn!(%manifest_url, "Item time budget spent before key lookup finished");
                Ok(StreamInfo::manifest_only(manifest_url.as_str()))
            }
        }
    }

    async fn resolve_entry(&self, stub: VideoStub) -> Option<CatalogEntry> {
        let deadline = self.item_timeout.map(|limit| Instant::now() + limit);

        match self.resolve_stream_until(&stub.detail_url, deadline).await {
            Ok(stream) => Some(CatalogEntry::merge(stub, stream)),
            Err(e) => {
                warn!(detail_url = %stub.detail_url, error = %e, "Skipping entry");
                None
            }
        }
    }
}
