//! HTTP client for Douban requests using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::douban::cookies::Cookies;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use wreq::cookie::Jar;
use wreq::Client;
use wreq_util::Emulation;

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL the body was served from, after redirects
    pub url: Url,
    /// Response body
    pub html: String,
}

/// Trait for page fetching - enables mocking for tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches a page and returns its body along with the final URL.
    async fn fetch(&self, url: &Url) -> Result<Page>;
}

/// Origin that browser-copied session cookies belong to.
const COOKIE_ORIGIN: &str = "https://book.douban.com/";

/// Douban HTTP client with browser impersonation and a session cookie.
pub struct DoubanClient {
    client: Client,
    user_agent: Option<String>,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl DoubanClient {
    /// Creates a new client with the given configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_provider(Arc::new(session_jar(config)))
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Performs a GET request with the session cookie and browser headers.
    async fn get(&self, url: &Url) -> Result<Page> {
        self.delay().await;

        debug!("GET {}", url);

        let mut request = self
            .client
            .get(url.as_str())
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
            .header("Referer", "https://book.douban.com/")
            .header("Upgrade-Insecure-Requests", "1");

        if let Some(agent) = &self.user_agent {
            request = request.header("User-Agent", agent.as_str());
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 403 || status == 418 {
            warn!("Blocked ({}). The session cookie may be missing or expired.", status);
            anyhow::bail!("Blocked by Douban ({}). Try passing --cookie or increasing --delay.", status);
        }

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        let final_url = Url::parse(&response.uri().to_string()).unwrap_or_else(|_| url.clone());
        if final_url != *url {
            debug!("Redirected to {}", final_url);
        }

        let html = response.text().await.context("Failed to read response body")?;
        Ok(Page { url: final_url, html })
    }

    /// Adds a random delay between requests.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }

}

/// Seeds a cookie jar with the configured session cookies.
///
/// Pairs are stored host-only under `/` for the Douban origin, each allowed
/// domain and the start URL's origin. Response cookies land in the same jar.
fn session_jar(config: &Config) -> Jar {
    let jar = Jar::default();
    let cookies = config.cookie.as_deref().map(Cookies::parse).unwrap_or_default();
    if cookies.is_empty() {
        return jar;
    }

    let mut origins = vec![COOKIE_ORIGIN.to_string()];
    origins.extend(config.allowed_domains.iter().map(|domain| format!("https://{}/", domain)));
    if let Ok(start) = Url::parse(&config.start_url) {
        origins.push(start.origin().ascii_serialization() + "/");
    }

    for origin in &origins {
        for (name, value) in cookies.iter() {
            jar.add(format!("{}={}; Path=/", name, value), origin.as_str());
        }
    }

    debug!("Using {} session cookies", cookies.len());
    jar
}

#[async_trait]
impl PageSource for DoubanClient {
    async fn fetch(&self, url: &Url) -> Result<Page> {
        info!("Fetching {}", url);
        self.get(url).await
    }
}
