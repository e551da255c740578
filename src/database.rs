use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// A stored document along with the time it was last written
pub struct DocumentRecord {
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

/// Embedded document table keyed by (collection, id)
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, doc_id)
            )",
            [],
        )?;

        // Listing pages are resolved per collection
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_collection ON documents(collection)",
            [],
        )?;

        Ok(())
    }

    /// Insert a document or replace the existing one with the same id
    pub fn put_document(&self, collection: &str, doc_id: &str, data: &Value) -> Result<()> {
        let serialized = serde_json::to_string(data)?;
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, data, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, doc_id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at",
            params![collection, doc_id, serialized, Utc::now()],
        )?;
        Ok(())
    }

    /// Get a document by id, `None` when it does not exist
    pub fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<DocumentRecord>> {
        let row: Option<(String, DateTime<Utc>)> = self.conn
            .query_row(
                "SELECT data, updated_at FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection, doc_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((data, updated_at)) => {
                let data = serde_json::from_str(&data)
                    .with_context(|| format!("Corrupt document {}/{}", collection, doc_id))?;
                Ok(Some(DocumentRecord {
                    data,
                    updated_at,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn document_exists(&self, collection: &str, doc_id: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = ?1 AND doc_id = ?2)",
            params![collection, doc_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn delete_document(&self, collection: &str, doc_id: &str) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
            params![collection, doc_id],
        )?;
        Ok(deleted > 0)
    }

    pub fn count_documents(&self, collection: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
