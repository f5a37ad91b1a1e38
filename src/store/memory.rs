//! In-process result store with bounded capacity and expiry

use super::{resolve_id, ResultStore};
use crate::error::Result;
use crate::models::PipelineResult;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

pub struct MemoryStore {
    cache: Cache<String, PipelineResult>,
}

impl MemoryStore {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn save(&self, result: &PipelineResult) -> Result<String> {
        let id = resolve_id(result);
        let mut record = result.clone();
        record.id = id.clone();
        self.cache.insert(id.clone(), record).await;
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<PipelineResult>> {
        Ok(self.cache.get(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::sample_result;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new(100, Duration::from_secs(60));
        let id = store.save(&sample_result("")).await.unwrap();
        let loaded = store.load(&id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert!(store.load("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = MemoryStore::new(100, Duration::from_millis(50));
        let id = store.save(&sample_result("short")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(store.load(&id).await.unwrap().is_none());
    }
}
