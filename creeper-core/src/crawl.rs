use anyhow::{Context, Result};
use creeper_scanner::{ClientConfig, CrawlConfig, CrawlResult, Crawler};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// User-Agent sent when the caller did not supply one
pub const DEFAULT_USER_AGENT: &str = concat!("Creeper/", env!("CARGO_PKG_VERSION"));

/// Redirects followed per request before the last response is kept
pub const MAX_REDIRECTS: usize = 10;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub max_depth: usize,
    pub workers: usize,
    pub timeout: Duration,
    pub requests_per_second: f64,
    pub headers: HashMap<String, String>,
    /// Budget for the whole run. `None` falls back to `timeout`; a zero
    /// duration disables the budget.
    pub deadline: Option<Duration>,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_depth: 3,
            workers: 10,
            timeout: Duration::from_secs(30),
            requests_per_second: 10.0,
            headers: HashMap::new(),
            deadline: None,
            show_progress_bars: false,
        }
    }
}

impl CrawlOptions {
    pub fn into_config(self) -> CrawlConfig {
        let mut headers = self.headers;
        ensure_user_agent(&mut headers);

        let deadline = match self.deadline.unwrap_or(self.timeout) {
            d if d.is_zero() => None,
            d => Some(d),
        };

        CrawlConfig {
            base_url: self.url.clone(),
            max_depth: self.max_depth,
            workers: self.workers,
            deadline,
            client: ClientConfig {
                timeout: self.timeout,
                max_redirects: MAX_REDIRECTS,
                headers,
                requests_per_second: self.requests_per_second,
                base_url: self.url,
            },
            ..CrawlConfig::default()
        }
    }
}

/// Callback for reporting individual crawl results as they come in
pub type CrawlResultCallback = Arc<dyn Fn(&CrawlResult) + Send + Sync>;

/// Parse `key=value` pairs separated by commas.
///
/// Only the first `=` splits a pair, so values may contain `=`. Pairs
/// without one, or with an empty key, are ignored.
pub fn parse_headers(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Insert the default User-Agent unless one is already present, in any case.
pub fn ensure_user_agent(headers: &mut HashMap<String, String>) {
    if !headers
        .keys()
        .any(|key| key.eq_ignore_ascii_case("user-agent"))
    {
        headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Execute a crawl with the given options
/// Returns the crawl results in arrival order
pub async fn execute_crawl(
    options: CrawlOptions,
    result_callback: Option<CrawlResultCallback>,
) -> Result<Vec<CrawlResult>> {
    let show_progress_bars = options.show_progress_bars;
    let target = options.url.clone();

    let crawler = Crawler::new(options.into_config())
        .with_context(|| format!("Failed to initialize crawler for '{}'", target))?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .context("Invalid progress bar template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let mut stream = crawler.start().context("Failed to start crawl")?;
    let mut results = Vec::new();

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    let mut stopping = false;

    loop {
        tokio::select! {
            next = stream.recv() => {
                let Some(result) = next else { break };

                if let Some(ref pb) = progress_bar {
                    pb.set_message(format!(
                        "Crawling... {} URLs processed ({})",
                        results.len() + 1,
                        extract_url_path(&result.url)
                    ));
                }
                if let Some(ref callback) = result_callback {
                    callback(&result);
                }
                results.push(result);
            }
            _ = &mut interrupted, if !stopping => {
                stopping = true;
                warn!("Interrupted, stopping crawl");
                crawler.stop().await;
            }
        }
    }

    crawler.stop().await;

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", results.len()));
    }
    info!("Crawl of {} finished with {} results", target, results.len());

    Ok(results)
}
