//! In-memory page backend for tests
//!
//! Pages are keyed by URL and answer selector queries from fixed element
//! lists. The renderer counts opened, closed and concurrently live sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Element, ElementHandle, PageRenderer, PageSession};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeElement {
    attrs: HashMap<String, String>,
    text: Option<String>,
    inner_html: Option<String>,
    children: HashMap<String, FakeElement>,
    failing: bool,
}

impl FakeElement {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub(crate) fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub(crate) fn html(mut self, html: &str) -> Self {
        self.inner_html = Some(html.to_string());
        self
    }

    pub(crate) fn child(mut self, selector: &str, child: FakeElement) -> Self {
        self.children.insert(selector.to_string(), child);
        self
    }

    /// Every read on this element errors
    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            Err(CatalogError::Browser("element detached".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn find(&self, selector: &str) -> Result<Option<Element>> {
        self.check()?;
        Ok(self
            .children
            .get(selector)
            .cloned()
            .map(|child| Box::new(child) as Element))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.attrs.get(name).cloned())
    }

    async fn text(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.text.clone())
    }

    async fn inner_html(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.inner_html.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePage {
    elements: HashMap<String, Vec<FakeElement>>,
    failing_queries: bool,
    query_delay: Option<Duration>,
}

impl FakePage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    /// Every `find_all` on this page errors
    pub(crate) fn failing_queries(mut self) -> Self {
        self.failing_queries = true;
        self
    }

    /// Every `find_all` on this page takes `delay`
    pub(crate) fn slow(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeStats {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeStats {
    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Highest number of sessions open at the same time
    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeRenderer {
    pages: HashMap<String, FakePage>,
    stats: FakeStats,
}

impl FakeRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub(crate) fn stats(&self) -> FakeStats {
        self.stats.clone()
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| CatalogError::Navigation {
                url: url.to_string(),
                reason: "no such page".to_string(),
            })?;

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            page,
            stats: self.stats.clone(),
        }))
    }
}

struct FakeSession {
    page: FakePage,
    stats: FakeStats,
}

#[async_trait]
impl PageSession for FakeSession {
    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        if let Some(delay) = self.page.query_delay {
            tokio::time::sleep(delay).await;
        }
        if self.page.failing_queries {
            return Err(CatalogError::Browser("target crashed".to_string()));
        }
        Ok(self
            .page
            .elements
            .get(selector)
            .map(|elements| {
                elements
                    .iter()
                    .cloned()
                    .map(|element| Box::new(element) as Element)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
