//! Evidence selection: per-source ranking and the global evidence cap

use super::embedder::{dot, Embedder};
use crate::error::Result;
use crate::extract::Extractor;
use crate::models::Source;
use futures::future::join_all;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Passages less similar than this to the claim are never kept
pub const SIMILARITY_FLOOR: f32 = 0.25;
/// Passages longer than this are truncated before storage
pub const MAX_EVIDENCE_CHARS: usize = 500;
const TRUNCATED_EVIDENCE_CHARS: usize = 497;

/// Default passages kept per source
pub const DEFAULT_PER_SOURCE: usize = 2;
/// Default passages kept across all sources
pub const DEFAULT_MAX_TOTAL: usize = 8;

/// Paragraph paired with its similarity to the claim
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPassage<'a> {
    pub text: &'a str,
    pub similarity: f32,
}

/// Populates each source's evidence with its most claim-relevant passages
pub struct EvidenceSelector {
    extractor: Extractor,
    embedder: Arc<dyn Embedder>,
}

impl EvidenceSelector {
    pub fn new(extractor: Extractor, embedder: Arc<dyn Embedder>) -> Self {
        Self { extractor, embedder }
    }

    /// Select evidence for every source.
    ///
    /// Only a failure to embed the claim itself is returned as an error;
    /// per-source extraction or embedding failures leave that source with
    /// empty evidence.
    pub async fn select(
        &self,
        claim: &str,
        sources: Vec<Source>,
        per_source: usize,
        max_total: usize,
    ) -> Result<Vec<Source>> {
        let claim_vector = self.embedder.embed_one(claim).await?;

        let all_paragraphs = join_all(
            sources
                .iter()
                .map(|source| self.extractor.paragraphs_with_fallback(source)),
        )
        .await;

        let mut selected = Vec::with_capacity(sources.len());
        for (source, paragraphs) in sources.into_iter().zip(all_paragraphs) {
            if paragraphs.is_empty() {
                debug!("No paragraphs for {}", source.url);
                selected.push(source);
                continue;
            }

            let evidence = match self.embedder.embed(&paragraphs).await {
                Ok(vectors) => rank_passages(&claim_vector, &paragraphs, &vectors, per_source),
                Err(e) => {
                    warn!("Embedding failed for {}, dropping its evidence: {}", source.url, e);
                    Vec::new()
                }
            };
            debug!("Kept {} passages from {}", evidence.len(), source.url);
            selected.push(Source { evidence, ..source });
        }

        let removed = cap_total_evidence(&mut selected, max_total);
        info!(
            "Selected {} passages across {} sources ({} trimmed by global cap)",
            total_evidence(&selected),
            selected.len(),
            removed
        );
        Ok(selected)
    }
}

/// Score paragraphs against the claim, sorted by descending similarity.
/// Ties keep paragraph order.
pub fn score_passages<'a>(
    claim_vector: &[f32],
    paragraphs: &'a [String],
    vectors: &[Vec<f32>],
) -> Vec<ScoredPassage<'a>> {
    let mut scored: Vec<ScoredPassage> = paragraphs
        .iter()
        .zip(vectors)
        .map(|(text, vector)| ScoredPassage {
            text,
            similarity: dot(claim_vector, vector),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    scored
}

/// Top `per_source` passages at or above the similarity floor, truncated
pub fn rank_passages(
    claim_vector: &[f32],
    paragraphs: &[String],
    vectors: &[Vec<f32>],
    per_source: usize,
) -> Vec<String> {
    score_passages(claim_vector, paragraphs, vectors)
        .into_iter()
        .take(per_source)
        .filter(|passage| passage.similarity >= SIMILARITY_FLOOR)
        .map(|passage| truncate_evidence(passage.text.trim()))
        .collect()
}

/// Truncate to 497 characters plus `...` when over the evidence limit
pub fn truncate_evidence(text: &str) -> String {
    if text.chars().count() <= MAX_EVIDENCE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(TRUNCATED_EVIDENCE_CHARS).collect();
    out.push_str("...");
    out
}

pub fn total_evidence(sources: &[Source]) -> usize {
    sources.iter().map(|s| s.evidence.len()).sum()
}

/// Trim evidence round-robin until the total is at most `max_total`.
///
/// Each pass walks sources in order and pops the last passage of each
/// non-empty one, stopping the moment the total fits. Returns the number of
/// passages removed.
pub fn cap_total_evidence(sources: &mut [Source], max_total: usize) -> usize {
    let mut total = total_evidence(sources);
    let mut removed = 0;

    while total > max_total {
        for source in sources.iter_mut() {
            if source.evidence.pop().is_some() {
                total -= 1;
                removed += 1;
            }
            if total <= max_total {
                break;
            }
        }
    }
    removed
}
