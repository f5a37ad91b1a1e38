//! Result persistence
//!
//! Stores completed pipeline results under short random ids for later
//! retrieval.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::models::PipelineResult;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Length of generated result ids
pub const ID_LEN: usize = 10;

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a result and return its id
    async fn save(&self, result: &PipelineResult) -> Result<String>;

    /// Fetch a result by id
    async fn load(&self, id: &str) -> Result<Option<PipelineResult>>;
}

/// Random ASCII-alphanumeric id
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// The result's own id if it has one, otherwise a fresh one
pub fn resolve_id(result: &PipelineResult) -> String {
    if result.id.is_empty() {
        generate_id()
    } else {
        result.id.clone()
    }
}

/// Build the configured store
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn ResultStore>> {
    match config.backend {
        StoreBackend::Sqlite => {
            info!("Using SQLite result store at {}", config.path);
            Ok(Arc::new(SqliteStore::open(&config.path)?))
        }
        StoreBackend::Memory => {
            info!(
                "Using in-memory result store (capacity {}, ttl {:?})",
                config.memory_capacity,
                config.memory_ttl()
            );
            Ok(Arc::new(MemoryStore::new(config.memory_capacity, config.memory_ttl())))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{PipelineResult, Verdict};

    pub fn sample_result(id: &str) -> PipelineResult {
        PipelineResult {
            claim: "The moon is made of cheese".to_string(),
            verdict: Verdict::False,
            confidence: 0.812,
            rationale: "Evidence contradicts the claim based on [1]. Rock.".to_string(),
            post: "Verdict: False — Rock.".to_string(),
            sources: Vec::new(),
            id: id.to_string(),
        }
    }
}
