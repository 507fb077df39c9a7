//! Static HTML backend
//!
//! Fetches the raw document and answers selector queries against the parsed
//! HTML. No script runs, so this only suits pages whose markup already
//! contains the cards and scripts of interest.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{Element, ElementHandle, PageRenderer, PageSession};
use crate::client::HttpClient;
use crate::error::{CatalogError, Result};

/// Renderer that fetches pages over plain HTTP
#[derive(Debug, Clone)]
pub struct SnapshotRenderer {
    client: HttpClient,
}

impl SnapshotRenderer {
    /// Create a renderer fetching through `client`
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for SnapshotRenderer {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        let html = self
            .client
            .fetch_text(url)
            .await
            .map_err(|e| CatalogError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Box::new(SnapshotSession { html }))
    }
}

struct SnapshotSession {
    html: String,
}

#[async_trait]
impl PageSession for SnapshotSession {
    async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        let snapshots = select_in_document(&self.html, selector)?;
        Ok(snapshots
            .into_iter()
            .map(|snapshot| Box::new(snapshot) as Element)
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.html.clear();
        Ok(())
    }
}

/// Owned copy of one matched element
///
/// `scraper` trees are not `Send`, so handles carry plain strings and
/// re-parse their own markup for nested queries.
#[derive(Debug, Clone)]
struct ElementSnapshot {
    outer_html: String,
    inner_html: String,
    text: String,
    attributes: Vec<(String, String)>,
}

impl ElementSnapshot {
    fn capture(element: ElementRef<'_>) -> Self {
        Self {
            outer_html: element.html(),
            inner_html: element.inner_html(),
            text: element.text().collect(),
            attributes: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ElementHandle for ElementSnapshot {
    async fn find(&self, selector: &str) -> Result<Option<Element>> {
        let found = select_in_fragment(&self.outer_html, selector)?;
        Ok(found.map(|snapshot| Box::new(snapshot) as Element))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone()))
    }

    async fn text(&self) -> Result<Option<String>> {
        Ok(Some(self.text.clone()))
    }

    async fn inner_html(&self) -> Result<Option<String>> {
        Ok(Some(self.inner_html.clone()))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| CatalogError::InvalidSelector(format!("{}: {:?}", selector, e)))
}

fn select_in_document(html: &str, selector: &str) -> Result<Vec<ElementSnapshot>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(ElementSnapshot::capture)
        .collect())
}

/// First descendant of the fragment's top element matching `selector`
fn select_in_fragment(outer_html: &str, selector: &str) -> Result<Option<ElementSnapshot>> {
    let selector = parse_selector(selector)?;
    let fragment = Html::parse_fragment(outer_html);
    let Some(top) = fragment.root_element().child_elements().next() else {
        return Ok(None);
    };

    Ok(top
        .select(&selector)
        .find(|candidate| candidate.id() != top.id())
        .map(ElementSnapshot::capture))
}
