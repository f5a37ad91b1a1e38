//! Data models shared across pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Minimum accepted claim length in characters
pub const CLAIM_MIN_CHARS: usize = 8;
/// Maximum accepted claim length in characters
pub const CLAIM_MAX_CHARS: usize = 1000;

/// Candidate web page returned by the search provider.
///
/// `evidence` starts empty and is only ever replaced by the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: Url,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl Source {
    pub fn new(title: impl Into<String>, url: Url) -> Self {
        Self {
            title: title.into(),
            url,
            snippet: None,
            evidence: Vec::new(),
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn has_evidence(&self) -> bool {
        !self.evidence.is_empty()
    }
}

/// Closed set of verdict labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    Misleading,
    Unverified,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::Misleading => "Misleading",
            Verdict::Unverified => "Unverified",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source indices (zero-based) backing each verdict role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMap {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contra: Vec<usize>,
}

impl CitationMap {
    pub fn supporting(index: usize) -> Self {
        Self {
            support: vec![index],
            contra: Vec::new(),
        }
    }

    pub fn contradicting(index: usize) -> Self {
        Self {
            support: Vec::new(),
            contra: vec![index],
        }
    }

    pub fn both(support: usize, contra: usize) -> Self {
        Self {
            support: vec![support],
            contra: vec![contra],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.contra.is_empty()
    }
}

/// Entailment oracle output for one (premise, hypothesis) pair.
///
/// Each probability is in [0, 1]; they need not sum to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NliScores {
    pub entail: f64,
    pub contradict: f64,
    pub neutral: f64,
}

impl NliScores {
    pub fn new(entail: f64, contradict: f64, neutral: f64) -> Self {
        Self {
            entail: entail.clamp(0.0, 1.0),
            contradict: contradict.clamp(0.0, 1.0),
            neutral: neutral.clamp(0.0, 1.0),
        }
    }
}

/// Externally visible outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub claim: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub rationale: String,
    pub post: String,
    pub sources: Vec<Source>,
    #[serde(default)]
    pub id: String,
}

/// Check request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub claim: String,
}

impl CheckRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_claim(&self.claim)
    }
}

/// Length check shared by the API surface and the pipeline entry point
pub fn validate_claim(claim: &str) -> Result<(), String> {
    let len = claim.chars().count();
    if len < CLAIM_MIN_CHARS {
        return Err(format!(
            "Claim must be at least {} characters (got {})",
            CLAIM_MIN_CHARS, len
        ));
    }
    if len > CLAIM_MAX_CHARS {
        return Err(format!(
            "Claim must be at most {} characters (got {})",
            CLAIM_MAX_CHARS, len
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serializes_as_label() {
        let json = serde_json::to_string(&Verdict::Misleading).unwrap();
        assert_eq!(json, "\"Misleading\"");
        let back: Verdict = serde_json::from_str("\"False\"").unwrap();
        assert_eq!(back, Verdict::False);
    }

    #[test]
    fn test_citation_map_skips_empty_roles() {
        let json = serde_json::to_value(CitationMap::supporting(2)).unwrap();
        assert_eq!(json, serde_json::json!({ "support": [2] }));
        let empty = serde_json::to_value(CitationMap::default()).unwrap();
        assert_eq!(empty, serde_json::json!({}));
    }

    #[test]
    fn test_source_defaults_on_deserialize() {
        let source: Source = serde_json::from_str(
            r#"{"title": "A", "url": "https://example.com/a"}"#,
        )
        .unwrap();
        assert!(source.snippet.is_none());
        assert!(source.evidence.is_empty());
    }

    #[test]
    fn test_source_rejects_relative_url() {
        let parsed: std::result::Result<Source, _> =
            serde_json::from_str(r#"{"title": "A", "url": "/relative"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_nli_scores_clamped() {
        let scores = NliScores::new(1.2, -0.1, 0.5);
        assert_eq!(scores.entail, 1.0);
        assert_eq!(scores.contradict, 0.0);
    }

    #[test]
    fn test_claim_validation_bounds() {
        assert!(validate_claim("short").is_err());
        assert!(validate_claim("eight ch").is_ok());
        assert!(validate_claim(&"x".repeat(1000)).is_ok());
        assert!(validate_claim(&"x".repeat(1001)).is_err());
    }
}
