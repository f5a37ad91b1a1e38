//! Error types for the claim verification pipeline

use std::time::Duration;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CheckError>;

/// Errors that abort a pipeline run.
///
/// Per-source fetch and extraction failures are not represented here: they
/// degrade that one source to empty evidence instead.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    #[error("Search provider error: {0}")]
    Search(String),

    #[error("Embedding oracle error: {0}")]
    Embedding(String),

    #[error("Entailment oracle error: {0}")]
    Entailment(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Pipeline deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckError {
    /// Whether the error came from an upstream collaborator (search, oracles,
    /// store, deadline) rather than from the request itself.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, CheckError::InvalidClaim(_))
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Configuration(_) => "configuration",
            CheckError::InvalidClaim(_) => "invalid_claim",
            CheckError::Search(_) => "search",
            CheckError::Embedding(_) => "embedding",
            CheckError::Entailment(_) => "entailment",
            CheckError::Store(_) => "store",
            CheckError::DeadlineExceeded(_) => "deadline",
            CheckError::Internal(_) => "internal",
        }
    }
}

impl From<rusqlite::Error> for CheckError {
    fn from(e: rusqlite::Error) -> Self {
        CheckError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for CheckError {
    fn from(e: serde_json::Error) -> Self {
        CheckError::Internal(e.to_string())
    }
}

impl From<config::ConfigError> for CheckError {
    fn from(e: config::ConfigError) -> Self {
        CheckError::Configuration(e.to_string())
    }
}
