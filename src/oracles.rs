//! Shared oracle instances
//!
//! Each oracle is built at most once per factory and then shared. A failed
//! construction is returned to the caller and retried on the next request.

use crate::config::{Config, EmbeddingBackend, EmbeddingConfig, NliConfig};
use crate::error::Result;
use crate::select::{Embedder, HashingEmbedder, HttpEmbedder};
use crate::verdict::{EntailmentScorer, HttpNliScorer};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

pub struct OracleFactory {
    embedding: EmbeddingConfig,
    nli: NliConfig,
    embedder: OnceCell<Arc<dyn Embedder>>,
    scorer: OnceCell<Arc<dyn EntailmentScorer>>,
}

impl OracleFactory {
    pub fn new(embedding: EmbeddingConfig, nli: NliConfig) -> Self {
        Self {
            embedding,
            nli,
            embedder: OnceCell::new(),
            scorer: OnceCell::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.embedding.clone(), config.nli.clone())
    }

    /// Shared embedding oracle
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        self.embedder
            .get_or_try_init(|| {
                let embedder: Arc<dyn Embedder> = match self.embedding.backend {
                    EmbeddingBackend::Http => {
                        info!(
                            "Initializing embedding oracle {} at {}",
                            self.embedding.model, self.embedding.endpoint
                        );
                        Arc::new(HttpEmbedder::new(self.embedding.clone())?)
                    }
                    EmbeddingBackend::Hashing => {
                        info!(
                            "Initializing hashing embedder ({} dimensions)",
                            self.embedding.dimensions
                        );
                        Arc::new(HashingEmbedder::new(self.embedding.dimensions))
                    }
                };
                Ok(embedder)
            })
            .cloned()
    }

    /// Shared entailment oracle
    pub fn scorer(&self) -> Result<Arc<dyn EntailmentScorer>> {
        self.scorer
            .get_or_try_init(|| {
                info!("Initializing entailment oracle {} at {}", self.nli.model, self.nli.endpoint);
                let scorer: Arc<dyn EntailmentScorer> = Arc::new(HttpNliScorer::new(self.nli.clone())?);
                Ok(scorer)
            })
            .cloned()
    }
}
