//! Plain HTTP client for raw document fetches
//!
//! Used for manifest playlists and for pages that need no script
//! rendering. No retries: a failed fetch is reported once to the caller.

use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::{CatalogError, Result};

/// HTTP client wrapper with a bounded request timeout
///
/// Handles:
/// - Request timeout (8 seconds by default)
/// - Proper headers (User-Agent, Accept-Language, optional Referer)
/// - Mapping non-success statuses and timeouts onto [`CatalogError`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        if let Some(referer) = &config.referer {
            let value = reqwest::header::HeaderValue::from_str(referer)
                .map_err(|_| CatalogError::InvalidUrl(referer.clone()))?;
            headers.insert(reqwest::header::REFERER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(CatalogError::HttpError)?;

        Ok(Self { client, timeout })
    }

    /// Fetch a URL and return its body as text
    ///
    /// # Errors
    /// - `Timeout` - no complete response within the configured timeout
    /// - `HttpStatus` - server answered with a non-2xx status
    /// - `HttpError` - any other network or body read failure
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.classify(url, e))
    }

    /// The request timeout this client was built with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> CatalogError {
        if error.is_timeout() {
            CatalogError::Timeout(format!("{} after {:?}", url, self.timeout))
        } else {
            CatalogError::HttpError(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().timeout(), Duration::from_secs(8));
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = HttpConfig {
            timeout_secs: 2,
            referer: Some("https://example.com/".to_string()),
            ..HttpConfig::default()
        };
        let client = HttpClient::with_config(&config).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_client_rejects_unprintable_referer() {
        let config = HttpConfig {
            referer: Some("bad\nvalue".to_string()),
            ..HttpConfig::default()
        };
        assert!(matches!(
            HttpClient::with_config(&config),
            Err(CatalogError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .fetch_text(&format!("{}/index.m3u8", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "#EXTM3U\n");
    }

    #[tokio::test]
    async fn test_fetch_text_sends_referer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.m3u8"))
            .and(header("referer", "https://example.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let config = HttpConfig {
            referer: Some("https://example.com/".to_string()),
            ..HttpConfig::default()
        };
        let client = HttpClient::with_config(&config).unwrap();
        let body = client
            .fetch_text(&format!("{}/index.m3u8", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_fetch_text_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let result = client.fetch_text(&format!("{}/index.m3u8", server.uri())).await;
        match result {
            Err(CatalogError::HttpStatus { status, .. }) => assert_eq!(status, 403),
            other => panic!("Expected HttpStatus error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_text_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = HttpConfig {
            timeout_secs: 1,
            ..HttpConfig::default()
        };
        let client = HttpClient::with_config(&config).unwrap();
        let result = client.fetch_text(&format!("{}/slow.m3u8", server.uri())).await;
        assert!(matches!(result, Err(CatalogError::Timeout(_))));
    }
}
