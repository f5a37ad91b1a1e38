//! Evidence aggregation into a verdict with citations

use super::nli::EntailmentScorer;
use crate::error::{CheckError, Result};
use crate::models::{CitationMap, NliScores, Source, Verdict};
use std::sync::Arc;
use tracing::{debug, info};

/// Premises shorter than this carry too little signal to score
pub const MIN_PREMISE_CHARS: usize = 40;
pub const TRUE_THRESHOLD: f64 = 0.60;
pub const FALSE_THRESHOLD: f64 = 0.60;
/// Minimum margin between the two signals for a decisive label
pub const DECISION_MARGIN: f64 = 0.20;
/// Signal strength needed before a near-tie counts as misleading
pub const MISLEADING_FLOOR: f64 = 0.50;

const QUOTE_MAX_CHARS: usize = 240;
const QUOTE_KEEP_CHARS: usize = 237;

pub const NO_EVIDENCE_RATIONALE: &str = "No strong evidence available from retrieved sources.";
pub const INSUFFICIENT_RATIONALE: &str = "Insufficient or conflicting evidence across retrieved sources.";

/// Evidence passage with the index of the source it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Premise {
    pub text: String,
    pub source_index: usize,
}

/// Aggregator output
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: Verdict,
    pub confidence: f64,
    pub rationale: String,
    pub citations: CitationMap,
}

impl Assessment {
    fn no_evidence() -> Self {
        Self {
            verdict: Verdict::Unverified,
            confidence: 0.0,
            rationale: NO_EVIDENCE_RATIONALE.to_string(),
            citations: CitationMap::default(),
        }
    }
}

pub struct Aggregator {
    scorer: Arc<dyn EntailmentScorer>,
}

impl Aggregator {
    pub fn new(scorer: Arc<dyn EntailmentScorer>) -> Self {
        Self { scorer }
    }

    /// Score every premise against the claim and decide a verdict.
    ///
    /// No oracle call is made when there is no usable evidence. Oracle
    /// failures propagate.
    pub async fn aggregate(&self, claim: &str, sources: &[Source]) -> Result<Assessment> {
        let premises = flatten_premises(sources);
        if premises.is_empty() {
            debug!("No usable premises, skipping entailment scoring");
            return Ok(Assessment::no_evidence());
        }

        let texts: Vec<String> = premises.iter().map(|p| p.text.clone()).collect();
        let scores = self.scorer.score_many(&texts, claim).await?;
        if scores.len() != premises.len() {
            return Err(CheckError::Entailment(format!(
                "Expected {} scores, got {}",
                premises.len(),
                scores.len()
            )));
        }

        let assessment = assess(&premises, &scores);
        info!(
            "Aggregated {} premises: {} ({:.3})",
            premises.len(),
            assessment.verdict,
            assessment.confidence
        );
        Ok(assessment)
    }
}

/// Flatten evidence in source order, dropping short premises
pub fn flatten_premises(sources: &[Source]) -> Vec<Premise> {
    sources
        .iter()
        .enumerate()
        .flat_map(|(index, source)| {
            source.evidence.iter().filter_map(move |text| {
                let text = text.trim();
                (text.chars().count() >= MIN_PREMISE_CHARS).then(|| Premise {
                    text: text.to_string(),
                    source_index: index,
                })
            })
        })
        .collect()
}

/// Decision rule over mean entailment `e` and mean contradiction `c`
pub fn decide(e: f64, c: f64) -> Verdict {
    if e >= TRUE_THRESHOLD && e - c >= DECISION_MARGIN {
        Verdict::True
    } else if c >= FALSE_THRESHOLD && c - e >= DECISION_MARGIN {
        Verdict::False
    } else if e.max(c) >= MISLEADING_FLOOR && (e - c).abs() < DECISION_MARGIN {
        Verdict::Misleading
    } else {
        Verdict::Unverified
    }
}

/// Build the assessment from premises and their scores (same order).
///
/// Only the paired prefix is considered when the lengths differ.
pub fn assess(premises: &[Premise], scores: &[NliScores]) -> Assessment {
    let scored: Vec<(&Premise, &NliScores)> = premises.iter().zip(scores).collect();
    if scored.is_empty() {
        return Assessment::no_evidence();
    }

    let n = scored.len() as f64;
    let e = scored.iter().map(|(_, s)| s.entail).sum::<f64>() / n;
    let c = scored.iter().map(|(_, s)| s.contradict).sum::<f64>() / n;
    let verdict = decide(e, c);

    let best_support = scored[first_max(scored.iter().map(|(_, s)| s.entail))].0;
    let best_contra = scored[first_max(scored.iter().map(|(_, s)| s.contradict))].0;

    let (rationale, citations) = match verdict {
        Verdict::True => (
            format!(
                "Evidence aligns with the claim based on [{}]. {}",
                best_support.source_index + 1,
                quote(&best_support.text)
            ),
            CitationMap::supporting(best_support.source_index),
        ),
        Verdict::False => (
            format!(
                "Evidence contradicts the claim based on [{}]. {}",
                best_contra.source_index + 1,
                quote(&best_contra.text)
            ),
            CitationMap::contradicting(best_contra.source_index),
        ),
        Verdict::Misleading => (
            format!(
                "Sources both support [{}] and contradict [{}] the claim.",
                best_support.source_index + 1,
                best_contra.source_index + 1
            ),
            CitationMap::both(best_support.source_index, best_contra.source_index),
        ),
        Verdict::Unverified => (INSUFFICIENT_RATIONALE.to_string(), CitationMap::default()),
    };

    Assessment {
        verdict,
        confidence: (e - c).abs(),
        rationale,
        citations,
    }
}

/// Index of the first maximum
fn first_max(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, v) in values.enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best.0
}

fn quote(text: &str) -> String {
    if text.chars().count() <= QUOTE_MAX_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(QUOTE_KEEP_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn premise(text: &str, source_index: usize) -> Premise {
        Premise {
            text: text.to_string(),
            source_index,
        }
    }

    fn source(evidence: &[&str]) -> Source {
        Source::new("Source", Url::parse("https://example.com/").unwrap())
            .with_evidence(evidence.iter().map(|e| e.to_string()).collect())
    }

    fn long(tag: &str) -> String {
        format!("{} passage with enough words to clear the premise length filter", tag)
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(0.65, 0.10), Verdict::True);
        assert_eq!(decide(0.10, 0.70), Verdict::False);
        assert_eq!(decide(0.55, 0.45), Verdict::Misleading);
        assert_eq!(decide(0.65, 0.50), Verdict::Misleading);
        assert_eq!(decide(0.55, 0.30), Verdict::Unverified);
        assert_eq!(decide(0.30, 0.30), Verdict::Unverified);
        assert_eq!(decide(0.55, 0.50), Verdict::Misleading);
        assert_eq!(decide(0.30, 0.20), Verdict::Unverified);
    }

    fn assess_single(entail: f64, contradict: f64) -> Assessment {
        let premises = vec![premise(&long("only"), 0)];
        let neutral = (1.0 - entail - contradict).max(0.0);
        assess(&premises, &[NliScores::new(entail, contradict, neutral)])
    }

    #[test]
    fn test_decision_table_confidences() {
        let rows = [
            (0.65, 0.10, Verdict::True, 0.55),
            (0.10, 0.70, Verdict::False, 0.60),
            (0.55, 0.50, Verdict::Misleading, 0.05),
            (0.30, 0.20, Verdict::Unverified, 0.10),
        ];
        for (e, c, verdict, confidence) in rows {
            let assessment = assess_single(e, c);
            assert_eq!(assessment.verdict, verdict, "E={} C={}", e, c);
            assert!(
                (assessment.confidence - confidence).abs() < 1e-9,
                "E={} C={} confidence {}",
                e,
                c,
                assessment.confidence
            );
        }
    }

    #[test]
    fn test_assess_ignores_unpaired_scores() {
        let premises = vec![premise(&long("only"), 0)];
        let scores = vec![NliScores::new(0.9, 0.05, 0.05), NliScores::new(0.0, 1.0, 0.0)];

        let assessment = assess(&premises, &scores);

        assert_eq!(assessment.verdict, Verdict::True);
        assert_eq!(assessment.citations, CitationMap::supporting(0));
    }

    #[test]
    fn test_weak_dominance_falls_through_to_unverified() {
        // One signal leads clearly, but neither is strong enough to decide.
        assert_eq!(decide(0.45, 0.20), Verdict::Unverified);
    }

    #[test]
    fn test_flatten_drops_short_and_keeps_owner() {
        let sources = vec![
            source(&["too short", &long("first")]),
            source(&[]),
            source(&[&long("third")]),
        ];
        let premises = flatten_premises(&sources);
        assert_eq!(premises.len(), 2);
        assert_eq!(premises[0].source_index, 0);
        assert_eq!(premises[1].source_index, 2);
    }

    #[test]
    fn test_true_cites_best_supporting_premise() {
        let premises = vec![premise(&long("weak"), 0), premise(&long("strong"), 1)];
        let scores = vec![NliScores::new(0.6, 0.1, 0.3), NliScores::new(0.7, 0.1, 0.2)];

        let assessment = assess(&premises, &scores);

        assert_eq!(assessment.verdict, Verdict::True);
        assert!((assessment.confidence - 0.55).abs() < 1e-9);
        assert!(assessment
            .rationale
            .starts_with("Evidence aligns with the claim based on [2]. strong passage"));
        assert_eq!(assessment.citations, CitationMap::supporting(1));
    }

    #[test]
    fn test_false_quotes_truncated_premise() {
        let text = "x".repeat(300);
        let premises = vec![premise(&text, 0)];
        let scores = vec![NliScores::new(0.1, 0.8, 0.1)];

        let assessment = assess(&premises, &scores);

        assert_eq!(assessment.verdict, Verdict::False);
        let expected = format!("Evidence contradicts the claim based on [1]. {}...", "x".repeat(237));
        assert_eq!(assessment.rationale, expected);
        assert_eq!(assessment.citations, CitationMap::contradicting(0));
    }

    #[test]
    fn test_misleading_cites_both_sides() {
        let premises = vec![premise(&long("pro"), 0), premise(&long("con"), 1)];
        let scores = vec![NliScores::new(0.95, 0.05, 0.0), NliScores::new(0.15, 0.85, 0.0)];

        let assessment = assess(&premises, &scores);

        assert_eq!(assessment.verdict, Verdict::Misleading);
        assert_eq!(
            assessment.rationale,
            "Sources both support [1] and contradict [2] the claim."
        );
        assert_eq!(assessment.citations, CitationMap::both(0, 1));
    }

    #[test]
    fn test_unverified_has_no_citations() {
        let premises = vec![premise(&long("meh"), 0)];
        let scores = vec![NliScores::new(0.3, 0.2, 0.5)];

        let assessment = assess(&premises, &scores);

        assert_eq!(assessment.verdict, Verdict::Unverified);
        assert_eq!(assessment.rationale, INSUFFICIENT_RATIONALE);
        assert!(assessment.citations.is_empty());
        assert!((assessment.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        let premises = vec![premise(&long("a"), 3), premise(&long("b"), 1)];
        let scores = vec![NliScores::new(0.8, 0.0, 0.2), NliScores::new(0.8, 0.0, 0.2)];
        assert_eq!(assess(&premises, &scores).citations, CitationMap::supporting(3));
    }

    struct CountingScorer {
        calls: AtomicUsize,
        scores: NliScores,
    }

    #[async_trait]
    impl EntailmentScorer for CountingScorer {
        async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<NliScores>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.scores; pairs.len()])
        }
    }

    /// Returns `pairs.len()` shifted by `skew` scores
    struct SkewedScorer {
        skew: isize,
    }

    #[async_trait]
    impl EntailmentScorer for SkewedScorer {
        async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<NliScores>> {
            let count = (pairs.len() as isize + self.skew).max(0) as usize;
            Ok(vec![NliScores::new(0.9, 0.05, 0.05); count])
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl EntailmentScorer for FailingScorer {
        async fn score(&self, _pairs: &[(String, String)]) -> Result<Vec<NliScores>> {
            Err(CheckError::Entailment("model offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_no_evidence_skips_oracle() {
        let scorer = Arc::new(CountingScorer {
            calls: AtomicUsize::new(0),
            scores: NliScores::new(1.0, 0.0, 0.0),
        });
        let aggregator = Aggregator::new(scorer.clone());

        let assessment = aggregator
            .aggregate("claim", &[source(&["short"]), source(&[])])
            .await
            .unwrap();

        assert_eq!(assessment.verdict, Verdict::Unverified);
        assert_eq!(assessment.confidence, 0.0);
        assert_eq!(assessment.rationale, NO_EVIDENCE_RATIONALE);
        assert!(assessment.citations.is_empty());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_aggregate_scores_all_premises() {
        let scorer = Arc::new(CountingScorer {
            calls: AtomicUsize::new(0),
            scores: NliScores::new(0.1, 0.9, 0.0),
        });
        let aggregator = Aggregator::new(scorer.clone());

        let assessment = aggregator
            .aggregate("claim", &[source(&[&long("one")]), source(&[&long("two")])])
            .await
            .unwrap();

        assert_eq!(assessment.verdict, Verdict::False);
        assert_eq!(assessment.citations, CitationMap::contradicting(0));
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_propagates() {
        let aggregator = Aggregator::new(Arc::new(FailingScorer));
        let result = aggregator.aggregate("claim", &[source(&[&long("one")])]).await;
        assert!(matches!(result, Err(CheckError::Entailment(_))));
    }

    #[tokio::test]
    async fn test_score_count_mismatch_is_an_oracle_error() {
        for skew in [1, -1] {
            let aggregator = Aggregator::new(Arc::new(SkewedScorer { skew }));
            let result = aggregator
                .aggregate("claim", &[source(&[&long("one")]), source(&[&long("two")])])
                .await;
            assert!(
                matches!(result, Err(CheckError::Entailment(ref msg)) if msg.contains("Expected 2 scores")),
                "skew {}: {:?}",
                skew,
                result
            );
        }
    }
}
