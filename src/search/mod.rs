//! Web search providers
//!
//! A provider turns a claim into an ordered, domain-deduplicated list of
//! candidate sources with empty evidence.

pub mod serper;

pub use serper::SerperSearch;

use crate::config::SearchConfig;
use crate::error::{CheckError, Result};
use crate::models::Source;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Default number of sources kept after deduplication
pub const DEFAULT_MAX_SOURCES: usize = 5;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name as reported by the health endpoint
    fn name(&self) -> &str;

    async fn search(&self, claim: &str) -> Result<Vec<Source>>;
}

/// Known provider names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Serper,
    Google,
    Brave,
}

impl ProviderKind {
    /// Unknown names resolve to Serper
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "google" => ProviderKind::Google,
            "brave" => ProviderKind::Brave,
            "serper" => ProviderKind::Serper,
            other => {
                warn!("Unknown search provider '{}', using serper", other);
                ProviderKind::Serper
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Serper => "serper",
            ProviderKind::Google => "google",
            ProviderKind::Brave => "brave",
        }
    }
}

/// Build the configured provider
pub fn build_provider(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    match ProviderKind::from_name(&config.provider) {
        ProviderKind::Serper => Ok(Arc::new(SerperSearch::new(config.clone())?)),
        kind => Err(CheckError::Configuration(format!(
            "search provider '{}' not implemented",
            kind.as_str()
        ))),
    }
}

/// Keep the first source per network location, at most `k` in total
pub fn dedupe_by_domain(items: Vec<Source>, k: usize) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for source in items {
        if out.len() >= k {
            break;
        }
        let Some(host) = source.url.host_str() else {
            continue;
        };
        let location = match source.url.port() {
            Some(port) => format!("{}:{}", host.to_lowercase(), port),
            None => host.to_lowercase(),
        };
        if seen.insert(location) {
            out.push(source);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn source(url: &str) -> Source {
        Source::new("t", Url::parse(url).unwrap())
    }

    #[test]
    fn test_dedupe_keeps_first_per_domain() {
        let items = vec![
            source("https://a.com/1"),
            source("https://A.com/2"),
            source("https://b.com/1"),
            source("https://www.a.com/3"),
        ];
        let out = dedupe_by_domain(items, 5);
        let urls: Vec<&str> = out.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com/1", "https://b.com/1", "https://www.a.com/3"]);
    }

    #[test]
    fn test_dedupe_caps_at_k() {
        let items = (0..8).map(|i| source(&format!("https://site{}.org/", i))).collect();
        let out = dedupe_by_domain(items, 5);
        assert_eq!(out.len(), 5);
        assert_eq!(out[4].url.as_str(), "https://site4.org/");
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(ProviderKind::from_name("Serper"), ProviderKind::Serper);
        assert_eq!(ProviderKind::from_name("brave"), ProviderKind::Brave);
        assert_eq!(ProviderKind::from_name("bing"), ProviderKind::Serper);
    }

    #[test]
    fn test_build_provider() {
        let config = SearchConfig::default();
        assert_eq!(build_provider(&config).unwrap().name(), "serper");

        let config = SearchConfig {
            provider: "google".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            build_provider(&config).err(),
            Some(CheckError::Configuration(msg)) if msg.contains("not implemented")
        ));
    }
}
