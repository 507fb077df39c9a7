//! Listing page extraction
//!
//! Reads up to N video cards from a script-rendered listing page. A card
//! that cannot be read is logged and skipped; only a failure to open or
//! query the page itself is returned as an error.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::browser::{ElementHandle, RenderedPageClient, Session};
use crate::config::ReadyCondition;
use crate::error::{CatalogError, Result};
use crate::types::VideoStub;
use crate::url::resolve_optional;

/// Attribute holding the real thumbnail on lazy-loaded images
pub const LAZY_IMAGE_ATTR: &str = "data-src";

/// CSS selectors locating the parts of a listing card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Card container (default: `.video-img-box`)
    pub card: String,
    /// Thumbnail inside a card (default: `img`)
    pub image: String,
    /// Title link inside a card (default: `.detail .title a`)
    pub title_link: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card: ".video-img-box".to_string(),
            image: "img".to_string(),
            title_link: ".detail .title a".to_string(),
        }
    }
}

/// Pulls [`VideoStub`]s from a listing page
#[derive(Clone)]
pub struct ListingExtractor {
    pages: RenderedPageClient,
    ready: ReadyCondition,
    selectors: ListingSelectors,
}

impl ListingExtractor {
    /// Create an extractor opening listing pages through `pages`
    pub fn new(pages: RenderedPageClient, ready: ReadyCondition) -> Self {
        Self {
            pages,
            ready,
            selectors: ListingSelectors::default(),
        }
    }

    /// Replace the default card selectors
    pub fn with_selectors(mut self, selectors: ListingSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Extract at most `max_count` stubs, in page order
    ///
    /// # Arguments
    /// * `listing_url` - Absolute URL of the listing page
    /// * `max_count` - Number of cards to consider (first N in document order)
    ///
    /// # Returns
    /// Stubs for every readable card among the first `max_count`. Relative
    /// links are resolved against `listing_url`; a card repeating an earlier
    /// detail URL is skipped.
    ///
    /// # Errors
    /// - `Navigation`/`Browser` if the listing page cannot be opened or queried
    #[instrument(skip(self))]
    pub async fn extract(&self, listing_url: &str, max_count: usize) -> Result<Vec<VideoStub>> {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let session = self.pages.open(listing_url, &self.ready).await?;
        let outcome = self.extract_from(&session, max_count).await;
        session.close().await;
        outcome
    }

    async fn extract_from(&self, session: &Session, max_count: usize) -> Result<Vec<VideoStub>> {
        let cards = session.find_all(&self.selectors.card).await?;
        debug!(found = cards.len(), max_count, "Listing cards found");

        let mut stubs = Vec::new();
        let mut seen = HashSet::new();

        for (index, card) in cards.iter().take(max_count).enumerate() {
            match read_card(card.as_ref(), session.url(), &self.selectors).await {
                Ok(stub) => {
                    if seen.insert(stub.detail_url.clone()) {
                        stubs.push(stub);
                    } else {
                        debug!(index, detail_url = %stub.detail_url, "Skipping duplicate listing card");
                    }
                }
                Err(e) => warn!(index, error = %e, "Skipping malformed listing card"),
            }
        }

        Ok(stubs)
    }
}

/// Reads one card; any missing required part is an error for this card only
async fn read_card(
    card: &dyn ElementHandle,
    page_url: &str,
    selectors: &ListingSelectors,
) -> Result<VideoStub> {
    let image_url = match card.find(&selectors.image).await? {
        Some(img) => read_image_url(img.as_ref(), page_url).await?,
        None => None,
    };

    let link = card
        .find(&selectors.title_link)
        .await?
        .ok_or_else(|| CatalogError::ElementNotFound(selectors.title_link.clone()))?;

    let title = link
        .text()
        .await?
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let href = link.attribute("href").await?;
    let detail_url = resolve_optional(page_url, href.as_deref())
        .ok_or_else(|| CatalogError::ElementNotFound(format!("{}[href]", selectors.title_link)))?;

    Ok(VideoStub {
        image_url,
        title,
        detail_url,
    })
}

/// Lazy-load attribute first: `src` may only hold a placeholder
async fn read_image_url(img: &dyn ElementHandle, page_url: &str) -> Result<Option<String>> {
    let lazy = img.attribute(LAZY_IMAGE_ATTR).await?;
    if let Some(url) = resolve_optional(page_url, lazy.as_deref()) {
        return Ok(Some(url));
    }

    let eager = img.attribute("src").await?;
    Ok(resolve_optional(page_url, eager.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeElement, FakePage, FakeRenderer, FakeStats};

    const LISTING_URL: &str = "https://example.com/categories/drama/";

    fn card(title: &str, href: &str) -> FakeElement {
        FakeElement::new().child(
            ".detail .title a",
            FakeElement::new().text(title).attr("href", href),
        )
    }

    fn card_with_image(title: &str, href: &str, img: FakeElement) -> FakeElement {
        card(title, href).child("img", img)
    }

    fn extractor(cards: Vec<FakeElement>) -> (ListingExtractor, FakeStats) {
        let renderer =
            FakeRenderer::new().page(LISTING_URL, FakePage::new().with(".video-img-box", cards));
        let stats = renderer.stats();
        let extractor =
            ListingExtractor::new(RenderedPageClient::new(renderer), ReadyCondition::Immediate);
        (extractor, stats)
    }

    #[tokio::test]
    async fn test_extract_reads_all_fields() {
        let (extractor, stats) = extractor(vec![card_with_image(
            "  Episode 1 \n",
            "https://example.com/videos/ep-1/",
            FakeElement::new()
                .attr("data-src", "https://img.example.com/ep-1.jpg")
                .attr("src", "https://example.com/placeholder.gif"),
        )]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        assert_eq!(
            stubs,
            vec![VideoStub {
                image_url: Some("https://img.example.com/ep-1.jpg".to_string()),
                title: "Episode 1".to_string(),
                detail_url: "https://example.com/videos/ep-1/".to_string(),
            }]
        );
        assert_eq!(stats.opened(), 1);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn test_image_falls_back_to_src() {
        let (extractor, _) = extractor(vec![
            card_with_image(
                "Empty lazy",
                "/videos/a/",
                FakeElement::new().attr("data-src", "").attr("src", "/thumbs/a.jpg"),
            ),
            card_with_image(
                "Eager only",
                "/videos/b/",
                FakeElement::new().attr("src", "https://img.example.com/b.jpg"),
            ),
            card_with_image("No attributes", "/videos/c/", FakeElement::new()),
            card("No image", "/videos/d/"),
        ]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        let images: Vec<Option<&str>> = stubs.iter().map(|s| s.image_url.as_deref()).collect();
        assert_eq!(
            images,
            vec![
                Some("https://example.com/thumbs/a.jpg"),
                Some("https://img.example.com/b.jpg"),
                None,
                None,
            ]
        );
    }

    #[tokio::test]
    async fn test_relative_detail_url_is_resolved() {
        let (extractor, _) = extractor(vec![card("Relative", "../../videos/rel/")]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        assert_eq!(stubs[0].detail_url, "https://example.com/videos/rel/");
    }

    #[tokio::test]
    async fn test_malformed_card_is_skipped() {
        let (extractor, stats) = extractor(vec![
            card("One", "/videos/1/"),
            FakeElement::new(),
            card("Three", "/videos/3/"),
        ]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        let titles: Vec<&str> = stubs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn test_link_without_href_is_skipped() {
        let (extractor, _) = extractor(vec![
            FakeElement::new().child(".detail .title a", FakeElement::new().text("No href")),
            card("Ok", "/videos/ok/"),
        ]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Ok");
    }

    #[tokio::test]
    async fn test_failing_card_reads_are_skipped() {
        let (extractor, _) = extractor(vec![FakeElement::new().failing(), card("Ok", "/videos/ok/")]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        assert_eq!(stubs.len(), 1);
    }

    #[tokio::test]
    async fn test_max_count_takes_first_cards() {
        let cards = (1..=5)
            .map(|i| card(&format!("V{}", i), &format!("/videos/{}/", i)))
            .collect();
        let (extractor, _) = extractor(cards);

        let stubs = extractor.extract(LISTING_URL, 3).await.unwrap();
        let titles: Vec<&str> = stubs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["V1", "V2", "V3"]);
    }

    #[tokio::test]
    async fn test_malformed_card_counts_towards_max_count() {
        let (extractor, _) = extractor(vec![
            FakeElement::new(),
            card("Two", "/videos/2/"),
            card("Three", "/videos/3/"),
        ]);

        let stubs = extractor.extract(LISTING_URL, 2).await.unwrap();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].title, "Two");
    }

    #[tokio::test]
    async fn test_duplicate_detail_urls_are_skipped() {
        let (extractor, _) = extractor(vec![
            card("First", "/videos/same/"),
            card("Again", "https://example.com/videos/same/"),
            card("Other", "/videos/other/"),
        ]);

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        let titles: Vec<&str> = stubs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Other"]);
    }

    #[tokio::test]
    async fn test_zero_max_count_opens_nothing() {
        let (extractor, stats) = extractor(vec![card("One", "/videos/1/")]);

        let stubs = extractor.extract(LISTING_URL, 0).await.unwrap();
        assert!(stubs.is_empty());
        assert_eq!(stats.opened(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_an_error() {
        let renderer = FakeRenderer::new();
        let extractor =
            ListingExtractor::new(RenderedPageClient::new(renderer), ReadyCondition::Immediate);

        let result = extractor.extract(LISTING_URL, 25).await;
        assert!(matches!(result, Err(CatalogError::Navigation { .. })));
    }

    #[tokio::test]
    async fn test_card_query_failure_closes_session() {
        let renderer = FakeRenderer::new().page(LISTING_URL, FakePage::new().failing_queries());
        let stats = renderer.stats();
        let extractor =
            ListingExtractor::new(RenderedPageClient::new(renderer), ReadyCondition::Immediate);

        let result = extractor.extract(LISTING_URL, 25).await;
        assert!(matches!(result, Err(CatalogError::Browser(_))));
        assert_eq!(stats.opened(), 1);
        assert_eq!(stats.closed(), 1);
    }

    #[tokio::test]
    async fn test_custom_selectors() {
        let renderer = FakeRenderer::new().page(
            LISTING_URL,
            FakePage::new().with(
                "article.item",
                vec![FakeElement::new().child(
                    "h2 a",
                    FakeElement::new().text("Custom").attr("href", "/v/1"),
                )],
            ),
        );
        let extractor =
            ListingExtractor::new(RenderedPageClient::new(renderer), ReadyCondition::Immediate)
                .with_selectors(ListingSelectors {
                    card: "article.item".to_string(),
                    image: "img.thumb".to_string(),
                    title_link: "h2 a".to_string(),
                });

        let stubs = extractor.extract(LISTING_URL, 25).await.unwrap();
        assert_eq!(stubs[0].detail_url, "https://example.com/v/1");
    }
}
