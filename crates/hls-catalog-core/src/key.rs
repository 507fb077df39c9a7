//! Encryption key address resolution for an HLS manifest
//!
//! Only the key's absolute URL is produced; the key itself is never
//! downloaded.

use tracing::{debug, instrument, warn};

use crate::client::HttpClient;
use crate::config::HttpConfig;
use crate::error::Result;
use crate::parser::find_key_uri;
use crate::types::StreamInfo;
use crate::url::resolve;

/// Fetches a manifest and resolves its AES-128 key URI
#[derive(Debug, Clone)]
pub struct KeyResolver {
    client: HttpClient,
}

impl KeyResolver {
    /// Create a resolver fetching through `client`
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Create a resolver with its own client built from `config`
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self::new(HttpClient::with_config(config)?))
    }

    /// Resolve the key URL declared by the manifest at `manifest_url`
    ///
    /// A failed or timed-out fetch, a non-success status and a key URI that
    /// cannot be resolved are logged and yield `key_url: None`, as does a
    /// playlist without a key declaration. A relative key URI is resolved
    /// against `manifest_url`.
    #[instrument(skip(self))]
    pub async fn resolve(&self, manifest_url: &str) -> StreamInfo {
        let playlist = match self.client.fetch_text(manifest_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Manifest fetch failed, keeping entry without key");
                return StreamInfo::manifest_only(manifest_url);
            }
        };

        let Some(uri) = find_key_uri(&playlist) else {
            debug!("No AES-128 key declaration, stream is unencrypted");
            return StreamInfo::manifest_only(manifest_url);
        };

        let key_url = match resolve(manifest_url, &uri) {
            Ok(url) => url,
            Err(e) => {
                warn!(%uri, error = %e, "Key URI not resolvable, keeping entry without key");
                return StreamInfo::manifest_only(manifest_url);
            }
        };
        debug!(%key_url, "Key URL resolved");

        StreamInfo {
            manifest_url: Some(manifest_url.to_string()),
            key_url: Some(key_url),
        }
    }
}
