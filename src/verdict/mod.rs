//! Verdict aggregation over entailment scores

pub mod aggregator;
pub mod nli;

pub use aggregator::{
    assess, decide, flatten_premises, Aggregator, Assessment, Premise, INSUFFICIENT_RATIONALE,
    NO_EVIDENCE_RATIONALE,
};
pub use nli::{EntailmentScorer, HttpNliScorer};
