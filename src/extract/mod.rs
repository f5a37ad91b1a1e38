//! Evidence extraction from fetched pages
//!
//! Recovers the main prose of a page through an ordered chain of strategies,
//! then segments it into deduplicated, length-filtered paragraphs.

pub mod fetcher;
pub mod segment;
pub mod strategies;

pub use fetcher::{HttpFetcher, PageFetcher};
pub use segment::{normalize_text, split_paragraphs};
pub use strategies::{extract_main_text, ExtractStrategy};

use crate::models::Source;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Markup to paragraphs. Empty when no strategy produces usable text.
pub fn extract(raw_markup: &str, source_url: &Url) -> Vec<String> {
    let Some((strategy, text)) = extract_main_text(raw_markup) else {
        debug!("No main content recovered from {}", source_url);
        return Vec::new();
    };
    let paragraphs = split_paragraphs(&text);
    debug!(
        "Extracted {} paragraphs from {} via {}",
        paragraphs.len(),
        source_url,
        strategy.as_str()
    );
    paragraphs
}

async fn extract_blocking(html: String, url: Url) -> Vec<String> {
    let label = url.to_string();
    match tokio::task::spawn_blocking(move || extract(&html, &url)).await {
        Ok(paragraphs) => paragraphs,
        Err(e) => {
            warn!("Extraction task for {} failed: {}", label, e);
            Vec::new()
        }
    }
}

/// Fetch-and-extract front end used by the selector
#[derive(Clone)]
pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
}

impl Extractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Paragraphs for one URL; empty on any fetch or extraction failure.
    /// Parsing runs on the blocking pool.
    pub async fn paragraphs(&self, url: &Url) -> Vec<String> {
        match self.fetcher.fetch(url).await {
            Some(html) => extract_blocking(html, url.clone()).await,
            None => Vec::new(),
        }
    }

    /// Paragraphs for a source, falling back to its snippet when the page
    /// yields nothing
    pub async fn paragraphs_with_fallback(&self, source: &Source) -> Vec<String> {
        let paragraphs = self.paragraphs(&source.url).await;
        if !paragraphs.is_empty() {
            return paragraphs;
        }
        match source.snippet.as_deref() {
            Some(snippet) if !snippet.is_empty() => {
                debug!("Using snippet fallback for {}", source.url);
                vec![snippet.to_string()]
            }
            _ => Vec::new(),
        }
    }
}
