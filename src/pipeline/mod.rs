//! End-to-end claim check: search, select, aggregate, compose, persist

use crate::compose::compose;
use crate::config::{Config, PipelineConfig};
use crate::error::{CheckError, Result};
use crate::extract::{Extractor, HttpFetcher};
use crate::metrics::METRICS;
use crate::models::{validate_claim, CitationMap, PipelineResult, Verdict};
use crate::oracles::OracleFactory;
use crate::search::{build_provider, SearchProvider};
use crate::select::{selector::total_evidence, Embedder, EvidenceSelector};
use crate::store::{build_store, ResultStore};
use crate::verdict::{Aggregator, EntailmentScorer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Rationale used when a run fails upstream
pub const FALLBACK_RATIONALE: &str =
    "We could not complete the evidence check right now. Please try again later.";

pub struct Pipeline {
    search: Arc<dyn SearchProvider>,
    selector: EvidenceSelector,
    aggregator: Aggregator,
    store: Arc<dyn ResultStore>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        extractor: Extractor,
        embedder: Arc<dyn Embedder>,
        scorer: Arc<dyn EntailmentScorer>,
        store: Arc<dyn ResultStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search,
            selector: EvidenceSelector::new(extractor, embedder),
            aggregator: Aggregator::new(scorer),
            store,
            config,
        }
    }

    /// Wire every collaborator from configuration
    pub fn from_config(config: &Config, oracles: &OracleFactory) -> Result<Self> {
        let search = build_provider(&config.search)?;
        let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
        let store = build_store(&config.store)?;

        Ok(Self::new(
            search,
            Extractor::new(fetcher),
            oracles.embedder()?,
            oracles.scorer()?,
            store,
            config.pipeline.clone(),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.search.name()
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Run one claim through the pipeline and persist the result.
    ///
    /// Invalid claims are rejected before any upstream call. Upstream
    /// failures and deadline expiry are returned as errors.
    pub async fn run(&self, claim: &str) -> Result<PipelineResult> {
        validate_claim(claim).map_err(CheckError::InvalidClaim)?;

        let span = info_span!("check", run_id = %Uuid::new_v4());
        let deadline = self.config.deadline();
        let start = Instant::now();

        let outcome = tokio::time::timeout(deadline, self.run_stages(claim))
            .instrument(span)
            .await
            .unwrap_or(Err(CheckError::DeadlineExceeded(deadline)));

        match &outcome {
            Ok(result) => {
                METRICS.record_check(
                    result.verdict.as_str(),
                    total_evidence(&result.sources),
                    start.elapsed().as_secs_f64(),
                );
            }
            Err(e) => {
                METRICS.record_check_failure(e.kind());
                error!("Check failed after {:?}: {}", start.elapsed(), e);
            }
        }
        outcome
    }

    /// Like [`Pipeline::run`], but upstream failures become a persisted
    /// `Unverified` fallback result. Only invalid claims are errors.
    pub async fn check(&self, claim: &str) -> Result<PipelineResult> {
        match self.run(claim).await {
            Err(e) if e.is_upstream() => {
                let mut result = fallback_result(claim, &e);
                match self.store.save(&result).await {
                    Ok(id) => result.id = id,
                    Err(store_err) => warn!("Failed to persist fallback result: {}", store_err),
                }
                Ok(result)
            }
            other => other,
        }
    }

    async fn run_stages(&self, claim: &str) -> Result<PipelineResult> {
        info!("Checking claim ({} chars)", claim.chars().count());

        let sources = self.search.search(claim).await?;
        let picked = self
            .selector
            .select(claim, sources, self.config.per_source, self.config.max_total)
            .await?;
        let assessment = self.aggregator.aggregate(claim, &picked).await?;
        let post = compose(
            claim,
            assessment.verdict,
            &assessment.rationale,
            &picked,
            &assessment.citations,
        );

        let mut result = PipelineResult {
            claim: claim.to_string(),
            verdict: assessment.verdict,
            confidence: round_confidence(assessment.confidence),
            rationale: assessment.rationale,
            post,
            sources: picked,
            id: String::new(),
        };
        result.id = self.store.save(&result).await?;

        info!(
            "Verdict {} ({:.3}) stored as {}",
            result.verdict, result.confidence, result.id
        );
        Ok(result)
    }
}

/// Unverified result substituted for a failed run
pub fn fallback_result(claim: &str, err: &CheckError) -> PipelineResult {
    warn!("Substituting fallback result: {}", err);
    let verdict = Verdict::Unverified;
    PipelineResult {
        claim: claim.to_string(),
        verdict,
        confidence: 0.0,
        rationale: FALLBACK_RATIONALE.to_string(),
        post: compose(claim, verdict, FALLBACK_RATIONALE, &[], &CitationMap::default()),
        sources: Vec::new(),
        id: String::new(),
    }
}

/// Absolute value rounded to three decimals
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence.abs() * 1000.0).round() / 1000.0
}
