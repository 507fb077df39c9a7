//! Command-line front end: crawls one listing page and writes the catalog
//! as JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hls_catalog_core::config::{DEFAULT_MANIFEST_TIMEOUT_SECS, DEFAULT_MAX_COUNT};
use hls_catalog_core::{
    BrowserOptions, Catalog, CatalogBuilder, CrawlConfig, HttpConfig, ReadyCondition,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIRECTIVE: &str = "hls_catalog=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Renderer {
    /// Headless Chrome, runs page scripts
    Chrome,
    /// Plain HTTP fetch, static HTML only
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "hls-catalog",
    version,
    about = "Build a JSON catalog of HLS streams from a video listing page"
)]
struct Cli {
    /// Listing page to crawl
    #[arg(long, env = "LISTING_URL")]
    listing_url: String,

    /// Where to write the catalog
    #[arg(default_value = "video_list.json")]
    output: PathBuf,

    /// Number of listing cards to consider
    #[arg(long, env = "MAX_COUNT", default_value_t = DEFAULT_MAX_COUNT)]
    max_count: usize,

    /// Detail pages resolved at the same time
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Page rendering backend
    #[arg(long, value_enum, default_value_t = Renderer::Chrome)]
    renderer: Renderer,

    /// Chrome executable (auto-detected when omitted)
    #[arg(long, env = "CHROME_PATH")]
    chrome: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Wait after opening the listing page, in milliseconds
    #[arg(long, default_value_t = 5000)]
    listing_settle_ms: u64,

    /// Wait after opening a detail page, in milliseconds
    #[arg(long, default_value_t = 1000)]
    detail_settle_ms: u64,

    /// Poll for this selector on the listing page instead of a fixed wait
    /// (bounded by --listing-settle-ms)
    #[arg(long)]
    ready_selector: Option<String>,

    /// Manifest fetch timeout in seconds
    #[arg(long, default_value_t = DEFAULT_MANIFEST_TIMEOUT_SECS)]
    manifest_timeout_secs: u64,

    /// Referer sent with manifest requests
    #[arg(long)]
    referer: Option<String>,

    /// Give up on a single detail page after this many seconds
    #[arg(long)]
    item_timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn crawl_config(&self) -> CrawlConfig {
        let listing_ready = match &self.ready_selector {
            Some(selector) => ReadyCondition::selector(
                selector.clone(),
                Duration::from_millis(self.listing_settle_ms),
            ),
            None => ReadyCondition::delay_ms(self.listing_settle_ms),
        };

        CrawlConfig {
            max_count: self.max_count,
            listing_ready,
            detail_ready: ReadyCondition::delay_ms(self.detail_settle_ms),
            http: HttpConfig {
                timeout_secs: self.manifest_timeout_secs,
                referer: self.referer.clone(),
                ..HttpConfig::default()
            },
            concurrency: self.concurrency,
            item_timeout: self.item_timeout_secs.map(Duration::from_secs),
        }
    }

    fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            headless: !self.headful,
            chrome_executable: self.chrome.clone(),
            ..BrowserOptions::default()
        }
    }

    fn catalog_builder(&self, config: &CrawlConfig) -> Result<CatalogBuilder> {
        let builder = match self.renderer {
            Renderer::Chrome => CatalogBuilder::chrome(self.browser_options(), config)?,
            Renderer::Snapshot => CatalogBuilder::snapshot(config)?,
        };
        Ok(builder)
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVE))?;

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(env_filter)
            .try_init()?,
    }

    Ok(())
}

/// Writes the catalog as pretty-printed JSON, keeping non-ASCII text as is
fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let json = serde_json::to_string_pretty(catalog).context("Failed to serialize catalog")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let config = cli.crawl_config();
    let builder = cli
        .catalog_builder(&config)
        .context("Failed to set up the crawler")?;

    info!(
        listing_url = %cli.listing_url,
        renderer = ?cli.renderer,
        max_count = config.max_count,
        concurrency = config.concurrency,
        "Starting crawl"
    );

    let catalog = match builder.build(&cli.listing_url).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "Failed to read listing page");
            return Err(e).with_context(|| format!("Failed to crawl {}", cli.listing_url));
        }
    };

    write_catalog(&cli.output, &catalog)?;
    info!("Wrote {} items to {}", catalog.len(), cli.output.display());

    Ok(())
}
