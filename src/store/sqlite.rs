//! SQLite-backed result store

use super::{resolve_id, ResultStore};
use crate::error::{CheckError, Result};
use crate::models::PipelineResult;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS results (
        id TEXT PRIMARY KEY,
        result_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )";

/// Results as JSON rows in a single table.
///
/// The connection is shared behind a mutex and only touched from blocking
/// tasks.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| CheckError::Store("Connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| CheckError::Internal(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn save(&self, result: &PipelineResult) -> Result<String> {
        let id = resolve_id(result);
        let mut record = result.clone();
        record.id = id.clone();
        let payload = serde_json::to_string(&record)?;
        let created_at = Utc::now().to_rfc3339();

        let row_id = id.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO results (id, result_json, created_at) VALUES (?1, ?2, ?3)",
                params![row_id, payload, created_at],
            )?;
            Ok(())
        })
        .await?;

        debug!("Saved result {}", id);
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Option<PipelineResult>> {
        let id = id.to_string();
        let payload: Option<String> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT result_json FROM results WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verdict;
    use crate::store::test_support::sample_result;

    #[tokio::test]
    async fn test_save_assigns_id_and_loads() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.save(&sample_result("")).await.unwrap();

        let loaded = store.load(&id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.verdict, Verdict::False);
        assert_eq!(loaded.confidence, 0.812);
    }

    #[tokio::test]
    async fn test_existing_id_is_replaced_in_place() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut result = sample_result("fixed00001");
        assert_eq!(store.save(&result).await.unwrap(), "fixed00001");

        result.verdict = Verdict::Misleading;
        store.save(&result).await.unwrap();

        let loaded = store.load("fixed00001").await.unwrap().unwrap();
        assert_eq!(loaded.verdict, Verdict::Misleading);
    }

    #[tokio::test]
    async fn test_missing_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");

        let id = SqliteStore::open(&path)
            .unwrap()
            .save(&sample_result(""))
            .await
            .unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.load(&id).await.unwrap().is_some());
    }
}
