//! Headless Chrome backend over the DevTools protocol
//!
//! Every session launches its own browser process with a private profile
//! directory, so detail pages never share cookies, caches or script state
//! with the listing page or with each other.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Element, ElementHandle, PageRenderer, PageSession};
use crate::config::BrowserOptions;
use crate::error::{CatalogError, Result};

static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);

fn cdp_error(e: chromiumoxide::error::CdpError) -> CatalogError {
    CatalogError::Browser(e.to_string())
}

/// Renderer that opens each page in a freshly launched headless Chrome
#[derive(Debug, Clone, Default)]
pub struct ChromeRenderer {
    options: BrowserOptions,
}

impl ChromeRenderer {
    /// Create a renderer with the given launch options
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    /// Launch options this renderer was built with
    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig> {
        let (width, height) = self.options.window_size;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .user_data_dir(profile_dir);

        if self.options.no_sandbox {
            builder = builder.no_sandbox();
        }
        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.options.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in self.options.switches() {
            builder = builder.arg(arg);
        }

        builder.build().map_err(CatalogError::Browser)
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        let profile_dir = std::env::temp_dir().join(format!(
            "hls-catalog-{}-{}",
            std::process::id(),
            PROFILE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let config = self.browser_config(&profile_dir)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp_error)?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let mut session = ChromeSession {
            browser: Some(browser),
            page: None,
            handler_task,
            profile_dir,
        };

        if let Err(e) = session.navigate(url).await {
            if let Err(close_error) = session.close().await {
                debug!(error = %close_error, "Browser close failed after navigation error");
            }
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let navigation_error = |reason: String| CatalogError::Navigation {
            url: url.to_string(),
            reason,
        };

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| navigation_error("browser already closed".to_string()))?;
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| navigation_error(e.to_string()))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| CatalogError::Browser("page is not open".to_string()))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        let elements = self
            .page()?
            .find_elements(selector)
            .await
            .map_err(cdp_error)?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromeElement(element)) as Element)
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            debug!(error = %e, "Page close failed, closing browser anyway");
        }

        let mut outcome = Ok(());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                outcome = Err(cdp_error(e));
            }
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "Browser process did not exit cleanly");
            }
        }

        self.handler_task.abort();
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!(dir = %self.profile_dir.display(), error = %e, "Profile directory not removed");
        }
        outcome
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();

        // Not closed: Browser's own Drop kills the child, then the profile goes.
        if let Some(browser) = self.browser.take() {
            drop(self.page.take());
            drop(browser);
            if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
                debug!(dir = %self.profile_dir.display(), error = %e, "Profile directory not removed");
            }
        }
    }
}

struct ChromeElement(chromiumoxide::Element);

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn find(&self, selector: &str) -> Result<Option<Element>> {
        let found = self.0.find_elements(selector).await.map_err(cdp_error)?;
        Ok(found
            .into_iter()
            .next()
            .map(|element| Box::new(ChromeElement(element)) as Element))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.0.attribute(name).await.map_err(cdp_error)
    }

    async fn text(&self) -> Result<Option<String>> {
        self.0.inner_text().await.map_err(cdp_error)
    }

    async fn inner_html(&self) -> Result<Option<String>> {
        self.0.inner_html().await.map_err(cdp_error)
    }
}
