//! Manifest lookup on a video detail page

use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::browser::{RenderedPageClient, Session, until_deadline};
use crate::config::ReadyCondition;
use crate::error::Result;
use crate::parser::{find_manifest_url, mentions_manifest};

const SCRIPT_SELECTOR: &str = "script";

/// Finds the HLS manifest URL embedded in a detail page's inline scripts
///
/// Every call opens its own session, so no rendering state leaks between
/// detail pages.
#[derive(Clone)]
pub struct ManifestLocator {
    pages: RenderedPageClient,
    ready: ReadyCondition,
}

impl ManifestLocator {
    pub fn new(pages: RenderedPageClient, ready: ReadyCondition) -> Self {
        Self { pages, ready }
    }

    /// Scan the page at `detail_url` for the first manifest URL
    ///
    /// Scripts are visited in document order and the scan stops at the
    /// first match.
    ///
    /// # Returns
    /// `Ok(None)` when no inline script references a manifest
    ///
    /// # Errors
    /// Session failures (open, query, element reads)
    #[instrument(skip(self))]
    pub async fn locate(&self, detail_url: &str) -> Result<Option<String>> {
        self.locate_until(detail_url, None).await
    }

    /// Like [`locate`](Self::locate), bounded by `deadline`
    ///
    /// The session is closed even when the deadline passes mid-scan.
    ///
    /// # Errors
    /// `Timeout` once `deadline` has passed, plus every `locate` error
    pub async fn locate_until(
        &self,
        detail_url: &str,
        deadline: Option<Instant>,
    ) -> Result<Option<String>> {
        let session = self.pages.open_until(detail_url, &self.ready, deadline).await?;
        let outcome = until_deadline(deadline, detail_url, scan_scripts(&session)).await;
        session.close().await;
        outcome
    }
}

async fn scan_scripts(session: &Session) -> Result<Option<String>> {
    let scripts = session.find_all(SCRIPT_SELECTOR).await?;

    for (index, script) in scripts.iter().enumerate() {
        let Some(source) = script.inner_html().await? else {
            continue;
        };
        if !mentions_manifest(&source) {
            continue;
        }
        if let Some(url) = find_manifest_url(&source) {
            debug!(index, %url, "Manifest reference found");
            return Ok(Some(url));
        }
    }

    debug!(scripts = scripts.len(), "No manifest reference in page scripts");
    Ok(None)
}
