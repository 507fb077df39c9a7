//! Configuration for the catalog pipeline
//!
//! All knobs are plain values handed to constructors, so several
//! differently-configured clients can live side by side.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of listing cards to process
pub const DEFAULT_MAX_COUNT: usize = 25;

/// Default manifest fetch timeout in seconds
pub const DEFAULT_MANIFEST_TIMEOUT_SECS: u64 = 8;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launch options for the headless browser backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Pass `--disable-gpu` (default: true)
    pub disable_gpu: bool,
    /// Pass `--no-sandbox` (default: true)
    pub no_sandbox: bool,
    /// Run without a visible window (default: true)
    pub headless: bool,
    /// Explicit Chrome/Chromium binary, autodetected when `None`
    pub chrome_executable: Option<PathBuf>,
    /// Viewport size in pixels (default: 1280x720)
    pub window_size: (u32, u32),
    /// Additional command-line switches
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            disable_gpu: true,
            no_sandbox: true,
            headless: true,
            chrome_executable: None,
            window_size: (1280, 720),
            extra_args: Vec::new(),
        }
    }
}

impl BrowserOptions {
    /// Command-line switches derived from the flags plus `extra_args`
    ///
    /// `--no-sandbox` is not included here because the browser builder
    /// has a dedicated setter for it.
    pub fn switches(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.extra_args.len() + 2);
        if self.disable_gpu {
            args.push("--disable-gpu".to_string());
        }
        args.push("--disable-dev-shm-usage".to_string());
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// How a freshly opened page decides its dynamic content has rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyCondition {
    /// Don't wait at all
    Immediate,
    /// Fixed settle delay
    Delay(Duration),
    /// Poll until `selector` matches at least one element, or give up after `timeout`
    Selector {
        selector: String,
        timeout: Duration,
        poll_interval: Duration,
    },
}

impl ReadyCondition {
    /// Fixed delay given in milliseconds
    pub fn delay_ms(ms: u64) -> Self {
        if ms == 0 {
            ReadyCondition::Immediate
        } else {
            ReadyCondition::Delay(Duration::from_millis(ms))
        }
    }

    /// Selector wait with a 250ms poll interval
    pub fn selector(selector: impl Into<String>, timeout: Duration) -> Self {
        ReadyCondition::Selector {
            selector: selector.into(),
            timeout,
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Configuration for the plain HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 8)
    pub timeout_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Optional Referer header sent with every request
    pub referer: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_MANIFEST_TIMEOUT_SECS,
            user_agent: USER_AGENT.to_string(),
            referer: None,
        }
    }
}

/// Configuration for one catalog run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Maximum number of listing cards to process (default: 25)
    pub max_count: usize,
    /// Ready condition for the listing page (default: 5s delay)
    pub listing_ready: ReadyCondition,
    /// Ready condition for each detail page (default: 1s delay)
    pub detail_ready: ReadyCondition,
    /// Manifest fetch settings
    pub http: HttpConfig,
    /// Detail pages resolved at once (default: 1, sequential)
    pub concurrency: usize,
    /// Wall-clock bound for one stub's resolution (default: unbounded)
    pub item_timeout: Option<Duration>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_MAX_COUNT,
            listing_ready: ReadyCondition::Delay(Duration::from_secs(5)),
            detail_ready: ReadyCondition::Delay(Duration::from_secs(1)),
            http: HttpConfig::default(),
            concurrency: 1,
            item_timeout: None,
        }
    }
}
