//! Claim verification pipeline
//!
//! Turns a natural-language claim plus candidate web sources into a verdict
//! (True / False / Misleading / Unverified) and a short, length-bounded post:
//! - Extractor: clean prose paragraphs from fetched pages
//! - Selector: semantic ranking and global evidence cap
//! - Aggregator: entailment/contradiction signal to verdict and citations
//! - Composer: single plain-text post within a hard byte budget

pub mod api;
pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod models;
pub mod oracles;
pub mod pipeline;
pub mod search;
pub mod select;
pub mod store;
pub mod verdict;

pub use error::{CheckError, Result};
pub use models::{CitationMap, NliScores, PipelineResult, Source, Verdict};
pub use pipeline::Pipeline;
