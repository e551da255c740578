use crate::database::Database;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Keyed document retrieval backing the listing page
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the name of the backend
    fn name(&self) -> &str;

    /// Fetches one document, `None` when no document exists under `key`
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;
}

/// Document store backed by the embedded SQLite table
pub struct SqliteStore {
    database: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(database: Arc<Mutex<Database>>) -> Self {
        Self { database }
    }

    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(Arc::new(Mutex::new(Database::new(path)?))))
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let db = self.database.lock().await;
        let record = db.get_document(collection, key)?;
        match &record {
            Some(r) => tracing::debug!("sqlite hit {}/{} (updated {})", collection, key, r.updated_at),
            None => tracing::debug!("sqlite miss {}/{}", collection, key),
        }
        Ok(record.map(|r| r.data))
    }
}
