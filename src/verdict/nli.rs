//! Entailment oracle

use crate::config::NliConfig;
use crate::error::{CheckError, Result};
use crate::metrics::METRICS;
use crate::models::NliScores;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

/// Scores (premise, hypothesis) pairs; output is order-preserving
#[async_trait]
pub trait EntailmentScorer: Send + Sync {
    async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<NliScores>>;

    /// Score many premises against one hypothesis
    async fn score_many(&self, premises: &[String], hypothesis: &str) -> Result<Vec<NliScores>> {
        let pairs: Vec<(String, String)> = premises
            .iter()
            .map(|p| (p.clone(), hypothesis.to_string()))
            .collect();
        self.score(&pairs).await
    }
}

/// Text-classification endpoint client for an MNLI-style model
pub struct HttpNliScorer {
    client: Client,
    config: NliConfig,
}

impl HttpNliScorer {
    pub fn new(config: NliConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(CheckError::Configuration("nli.batch_size must be positive".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CheckError::Configuration(format!("Failed to build NLI client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn score_batch(&self, batch: &[(String, String)]) -> Result<Vec<NliScores>> {
        let request = NliRequest {
            inputs: batch
                .iter()
                .map(|(premise, hypothesis)| NliPair {
                    text: premise,
                    text_pair: hypothesis,
                })
                .collect(),
        };

        let mut req = self.client.post(&self.config.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key.expose_secret());
        }

        let response = req
            .send()
            .await
            .map_err(|e| CheckError::Entailment(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckError::Entailment(format!("HTTP {}: {}", status, body)));
        }

        let results: Vec<Vec<LabelScore>> = response
            .json()
            .await
            .map_err(|e| CheckError::Entailment(format!("Invalid response: {}", e)))?;

        if results.len() != batch.len() {
            return Err(CheckError::Entailment(format!(
                "Expected {} results, got {}",
                batch.len(),
                results.len()
            )));
        }

        results.iter().map(|labels| parse_labels(labels)).collect()
    }
}

#[async_trait]
impl EntailmentScorer for HttpNliScorer {
    async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<NliScores>> {
        let mut scores = Vec::with_capacity(pairs.len());

        for batch in pairs.chunks(self.config.batch_size) {
            debug!("Scoring batch of {} pairs with {}", batch.len(), self.config.model);
            let start = Instant::now();
            let result = self.score_batch(batch).await;
            METRICS.record_oracle("entailment", result.is_ok(), start.elapsed().as_secs_f64());

            match result {
                Ok(batch_scores) => scores.extend(batch_scores),
                Err(e) => {
                    error!("Entailment request failed: {}", e);
                    return Err(e);
                }
            }
        }

        Ok(scores)
    }
}

#[derive(Debug, Serialize)]
struct NliRequest<'a> {
    inputs: Vec<NliPair<'a>>,
}

#[derive(Debug, Serialize)]
struct NliPair<'a> {
    text: &'a str,
    text_pair: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Map model labels (`ENTAILMENT`, `contradiction`, ...) onto the triple
fn parse_labels(labels: &[LabelScore]) -> Result<NliScores> {
    let find = |needle: &str| {
        labels
            .iter()
            .find(|l| l.label.to_lowercase().contains(needle))
            .map(|l| l.score)
            .ok_or_else(|| CheckError::Entailment(format!("Missing '{}' label in response", needle)))
    };

    Ok(NliScores::new(find("entail")?, find("contradict")?, find("neutral")?))
}
