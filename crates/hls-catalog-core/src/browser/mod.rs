//! Rendered page access
//!
//! [`RenderedPageClient`] opens one disposable session per URL on top of a
//! [`PageRenderer`] backend and waits for the page to settle before handing
//! it out. Two backends ship with the crate:
//! - [`ChromeRenderer`] drives a headless Chrome over CDP, for pages whose
//!   content only exists after client-side script runs
//! - [`SnapshotRenderer`] fetches raw HTML, for pages that need no rendering
//!
//! Every [`Session`] must be released with [`Session::close`]. The session
//! is consumed by `close`, so a closed session cannot be queried again.

mod chrome;
mod snapshot;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, warn};

use crate::config::ReadyCondition;
use crate::error::{CatalogError, Result};

pub use chrome::ChromeRenderer;
pub use snapshot::SnapshotRenderer;

/// A DOM element handle owned by a session backend
pub type Element = Box<dyn ElementHandle>;

/// Read access to one element of a rendered page
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// First descendant matching `selector`, `None` when nothing matches
    async fn find(&self, selector: &str) -> Result<Option<Element>>;

    /// Attribute value, `None` when the attribute is missing
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Text content (untrimmed)
    async fn text(&self) -> Result<Option<String>>;

    /// Raw inner HTML (for scripts: the script source)
    async fn inner_html(&self) -> Result<Option<String>>;
}

/// One open page inside a backend
#[async_trait]
pub trait PageSession: Send + Sync {
    /// All elements matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> Result<Vec<Element>>;

    /// Release every resource held by the session
    async fn close(&mut self) -> Result<()>;
}

/// Backend able to open a page session on a URL
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>>;
}

/// Guard around an open page session
///
/// Dropping the guard without calling [`Session::close`] (for example when a
/// timeout cancels the owning future) logs a warning and leaves cleanup to
/// the backend's own `Drop`.
pub struct Session {
    inner: Box<dyn PageSession>,
    url: String,
    closed: bool,
}

impl Session {
    fn new(inner: Box<dyn PageSession>, url: &str) -> Self {
        Self {
            inner,
            url: url.to_string(),
            closed: false,
        }
    }

    /// URL the session was opened on
    pub fn url(&self) -> &str {
        &self.url
    }

    /// All elements matching `selector`, in document order
    pub async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        self.inner.find_all(selector).await
    }

    /// Close the session
    ///
    /// Close failures are logged, not returned: the caller's outcome has
    /// already been decided by the time the session is released.
    pub async fn close(mut self) {
        self.closed = true;
        match self.inner.close().await {
            Ok(()) => debug!(url = %self.url, "Session closed"),
            Err(e) => warn!(url = %self.url, error = %e, "Failed to close session cleanly"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            warn!(url = %self.url, "Session dropped without close");
        }
    }
}

/// Opens settled page sessions through a [`PageRenderer`]
#[derive(Clone)]
pub struct RenderedPageClient {
    renderer: Arc<dyn PageRenderer>,
}

impl RenderedPageClient {
    /// Create a client over the given backend
    pub fn new(renderer: impl PageRenderer + 'static) -> Self {
        Self {
            renderer: Arc::new(renderer),
        }
    }

    /// Open a session on `url` and wait until `ready` is satisfied
    ///
    /// # Errors
    /// Returns the backend's error if the page cannot be opened. If waiting
    /// fails, the session is closed before the error is returned.
    pub async fn open(&self, url: &str, ready: &ReadyCondition) -> Result<Session> {
        self.open_until(url, ready, None).await
    }

    /// Like [`open`](Self::open), but gives up with `Timeout` at `deadline`
    ///
    /// A session opened before the deadline passes is closed before the
    /// `Timeout` is returned.
    pub async fn open_until(
        &self,
        url: &str,
        ready: &ReadyCondition,
        deadline: Option<Instant>,
    ) -> Result<Session> {
        let inner = until_deadline(deadline, url, self.renderer.open(url)).await?;
        let session = Session::new(inner, url);
        debug!(url, "Session opened");

        if let Err(e) = until_deadline(deadline, url, wait_until_ready(&session, ready)).await {
            session.close().await;
            return Err(e);
        }

        Ok(session)
    }
}

/// Runs `operation`, turning an elapsed `deadline` into `Timeout`
pub(crate) async fn until_deadline<T>(
    deadline: Option<Instant>,
    url: &str,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(deadline) = deadline else {
        return operation.await;
    };

    match timeout_at(deadline, operation).await {
        Ok(outcome) => outcome,
        Err(_) => Err(CatalogError::Timeout(format!("{} exceeded its time budget", url))),
    }
}

async fn wait_until_ready(session: &Session, ready: &ReadyCondition) -> Result<()> {
    match ready {
        ReadyCondition::Immediate => Ok(()),
        ReadyCondition::Delay(delay) => {
            sleep(*delay).await;
            Ok(())
        }
        ReadyCondition::Selector {
            selector,
            timeout,
            poll_interval,
        } => {
            let deadline = Instant::now() + *timeout;
            loop {
                if !session.find_all(selector).await?.is_empty() {
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    debug!(url = %session.url(), %selector, "Ready selector never matched, continuing");
                    return Ok(());
                }
                sleep(*poll_interval).await;
            }
        }
    }
}
