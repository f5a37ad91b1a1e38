//! Serper (Google results) search client

use super::{dedupe_by_domain, SearchProvider};
use crate::config::SearchConfig;
use crate::error::{CheckError, Result};
use crate::metrics::METRICS;
use crate::models::Source;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info};
use url::Url;

/// Organic results requested and read per query
const RESULTS_PER_QUERY: usize = 10;

pub struct SerperSearch {
    client: Client,
    config: SearchConfig,
}

impl SerperSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CheckError::Configuration(format!("Failed to build search client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn query(&self, api_key: &str, claim: &str) -> Result<SerperResponse> {
        let request = SerperRequest {
            q: claim,
            num: RESULTS_PER_QUERY,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("X-API-KEY", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CheckError::Search(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckError::Search(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| CheckError::Search(format!("Invalid response: {}", e)))
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    fn name(&self) -> &str {
        "serper"
    }

    async fn search(&self, claim: &str) -> Result<Vec<Source>> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| CheckError::Configuration("SERPER_API_KEY is not set".to_string()))?;

        let start = Instant::now();
        let result = self.query(api_key.expose_secret(), claim).await;
        METRICS.record_oracle("search", result.is_ok(), start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            error!("Search failed: {}", e);
            e
        })?;

        let candidates: Vec<Source> = response
            .organic
            .into_iter()
            .take(RESULTS_PER_QUERY)
            .filter_map(OrganicResult::into_source)
            .collect();
        debug!("Serper returned {} usable results", candidates.len());

        let sources = dedupe_by_domain(candidates, self.config.max_results);
        info!("Search produced {} sources", sources.len());
        Ok(sources)
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl OrganicResult {
    fn into_source(self) -> Option<Source> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let url = Url::parse(self.link.as_deref()?).ok()?;
        let mut source = Source::new(title, url);
        source.snippet = self.snippet;
        Some(source)
    }
}
