//! Page fetch transport
//!
//! Never fails past this boundary: blocked URLs, non-HTML responses, bad
//! statuses and transport errors all come back as `None`.

use crate::config::FetchConfig;
use crate::error::{CheckError, Result};
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

const BLOCKED_SCHEMES: &[&str] = &["javascript", "data"];
const BLOCKED_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Fetches raw page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Option<String>;
}

/// Whether a URL is rejected before any network access
pub fn is_blocked(url: &Url) -> bool {
    if BLOCKED_SCHEMES.contains(&url.scheme()) {
        return true;
    }
    let path = url.path().to_lowercase();
    BLOCKED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Whether a content-type header value is HTML-family
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    HTML_CONTENT_TYPES.iter().any(|t| content_type.contains(t))
}

/// reqwest-backed fetcher with bounded connect and total timeouts
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|e| CheckError::Configuration(format!("Failed to build fetch client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Option<String> {
        if is_blocked(url) {
            debug!("Skipping blocked url: {}", url);
            METRICS.record_fetch("blocked");
            return None;
        }

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fetch failed for {}: {}", url, e);
                METRICS.record_fetch(if e.is_timeout() { "timeout" } else { "error" });
                return None;
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !is_html_content_type(content_type) {
            debug!("Skipping non-html content type '{}' for {}", content_type, url);
            METRICS.record_fetch("not_html");
            return None;
        }

        let status = response.status();
        if !status.is_success() {
            warn!("Fetch of {} returned status {}", url, status);
            METRICS.record_fetch("bad_status");
            return None;
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > self.config.max_body_bytes)
        {
            warn!("Page {} exceeds {} bytes, skipping", url, self.config.max_body_bytes);
            METRICS.record_fetch("too_large");
            return None;
        }

        match response.text().await {
            Ok(body) if body.len() <= self.config.max_body_bytes => {
                METRICS.record_fetch("ok");
                Some(body)
            }
            Ok(_) => {
                warn!("Page {} exceeds {} bytes, skipping", url, self.config.max_body_bytes);
                METRICS.record_fetch("too_large");
                None
            }
            Err(e) => {
                warn!("Failed to read body of {}: {}", url, e);
                METRICS.record_fetch("error");
                None
            }
        }
    }
}
