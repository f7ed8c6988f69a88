use crate::error::{Result, ScanError};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Response;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Lowest request rate the limiter will be configured with.
pub const MIN_REQUESTS_PER_SECOND: f64 = 1.0;

/// Options for the scope-bound HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub headers: HashMap<String, String>,
    pub requests_per_second: f64,
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            headers: HashMap::new(),
            requests_per_second: 10.0,
            base_url: String::new(),
        }
    }
}

/// HTTP client bound to a single host, paced by a shared token bucket.
///
/// Cloning is cheap and every clone shares the same limiter, so requests
/// issued from any worker are serialized in time.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    headers: HeaderMap,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let max_redirects = config.max_redirects;
        let scope_host = base_url.host_str().map(str::to_owned);
        // Hand back the last response instead of failing once the limit is
        // hit, and never follow a redirect off the base hostname.
        let redirect_policy = Policy::custom(move |attempt| {
            if attempt.url().host_str() != scope_host.as_deref() {
                debug!("Not following off-host redirect to {}", attempt.url());
                attempt.stop()
            } else if attempt.previous().len() > max_redirects {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(redirect_policy)
            .build()?;

        Ok(Self {
            http,
            limiter: Arc::new(RateLimiter::direct(strict_quota(
                config.requests_per_second,
            ))),
            headers: build_header_map(&config.headers),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue a GET request once the rate limiter allows it.
    ///
    /// Both the limiter wait and the request race `cancel`; a cancelled wait
    /// never reaches the network.
    pub async fn get(&self, cancel: &CancellationToken, url: &str) -> Result<Response> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ScanError::Cancelled),
            _ = self.limiter.until_ready() => {}
        }

        let request_url =
            Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;

        debug!("GET {}", request_url);
        let request = self.http.get(request_url).headers(self.headers.clone());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            response = request.send() => Ok(response?),
        }
    }

    /// A URL is in scope when its hostname equals the base URL's hostname.
    pub fn is_in_scope(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => match (parsed.host_str(), self.base_url.host_str()) {
                (Some(host), Some(base_host)) => host == base_host,
                _ => false,
            },
            Err(_) => false,
        }
    }
}

/// Token bucket with a burst of one: requests are paced, never bursted.
fn strict_quota(requests_per_second: f64) -> Quota {
    let rps = requests_per_second.max(MIN_REQUESTS_PER_SECOND);
    Quota::with_period(Duration::from_secs_f64(1.0 / rps))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX))
        .allow_burst(NonZeroU32::MIN)
}

fn build_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("Skipping invalid header {}={}", key, value),
        }
    }
    map
}
