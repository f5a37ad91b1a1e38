//! Claim-relevant evidence selection
//!
//! Ranks each source's paragraphs by embedding similarity to the claim and
//! keeps a bounded number of passages per source and overall.

pub mod embedder;
pub mod selector;

pub use embedder::{Embedder, HashingEmbedder, HttpEmbedder};
pub use selector::{
    cap_total_evidence, rank_passages, truncate_evidence, EvidenceSelector, ScoredPassage,
    DEFAULT_MAX_TOTAL, DEFAULT_PER_SOURCE, MAX_EVIDENCE_CHARS, SIMILARITY_FLOOR,
};
