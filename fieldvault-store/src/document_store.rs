//! SQLite-backed document store.
//!
//! Documents are JSON objects stored one row per document, keyed by
//! collection name and `_id`. Writes pass through the field engine
//! before persistence; reads apply the narrow codec's recursive decode
//! so typed numbers and booleans come back typed. Full decryption stays
//! an explicit call, for callers authorized to see plaintext.

use crate::error::{StoreError, StoreResult};
use fieldvault_codec::narrow;
use fieldvault_engine::FieldEngine;
use futures::future::try_join_all;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// One page of query results.
#[derive(Debug)]
pub struct Page {
    /// The documents on this page.
    pub content: Vec<Value>,
    /// Total matching documents across all pages.
    pub total_elements: u64,
}

/// Document CRUD with transparent field encryption.
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
    engine: Arc<FieldEngine>,
}

impl DocumentStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path, engine: Arc<FieldEngine>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            engine,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(engine: Arc<FieldEngine>) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            engine,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts one document, encrypting configured fields first. A
    /// missing `_id` is filled with a fresh UUID. Returns the id.
    pub async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<String> {
        let (id, body) = self.prepare_insert(collection, document).await?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, body],
        )?;
        debug!(collection, id = %id, "inserted 1 document");
        Ok(id)
    }

    /// Inserts many documents in one transaction; encryption runs
    /// concurrently across documents. Returns the ids in input order.
    pub async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Value>,
    ) -> StoreResult<Vec<String>> {
        debug!(collection, count = documents.len(), "encrypting batch");
        let prepared = try_join_all(
            documents
                .into_iter()
                .map(|document| self.prepare_insert(collection, document)),
        )
        .await?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for (id, body) in &prepared {
            tx.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection, id, body],
            )?;
        }
        tx.commit()?;
        debug!(collection, count = prepared.len(), "inserted documents");

        Ok(prepared.into_iter().map(|(id, _)| id).collect())
    }

    /// Fetches one document by id, with typed values restored.
    pub fn find_one(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let conn = self.conn.lock().unwrap();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        debug!(collection, found = body.is_some(), "find_one");

        body.map(|b| parse_row(&b)).transpose()
    }

    /// Fetches one document by id and decrypts its configured fields.
    pub async fn find_one_decrypted(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<Value>> {
        match self.find_one(collection, id)? {
            Some(document) => Ok(Some(self.engine.decrypt(collection, document).await?)),
            None => Ok(None),
        }
    }

    /// Fetches a page of documents with typed values restored, plus the
    /// total count for the collection.
    pub fn find_all(&self, collection: &str, skip: u64, limit: u64) -> StoreResult<Page> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT body FROM documents WHERE collection = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![collection, limit as i64, skip as i64], |row| {
            row.get::<_, String>(0)
        })?;

        let mut content = Vec::new();
        for body in rows {
            content.push(parse_row(&body?)?);
        }

        let total_elements: u64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get::<_, i64>(0),
        )? as u64;
        debug!(collection, found = content.len(), "find_all");

        Ok(Page {
            content,
            total_elements,
        })
    }

    /// Counts documents in a collection.
    pub fn count(&self, collection: &str) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Replaces a document body by id, re-encrypting configured fields.
    /// Returns true when a row was updated.
    pub async fn update_one(
        &self,
        collection: &str,
        id: &str,
        mut document: Value,
    ) -> StoreResult<bool> {
        let Some(map) = document.as_object_mut() else {
            return Err(not_an_object());
        };
        map.insert("_id".to_string(), Value::String(id.to_string()));
        let encrypted = self.engine.encrypt(collection, &document).await?;
        let body = serde_json::to_string(&encrypted)?;

        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3",
            params![body, collection, id],
        )?;
        debug!(collection, id = %id, updated, "update_one");
        Ok(updated > 0)
    }

    /// Deletes one document by id. Returns true when a row was deleted.
    pub fn delete_one(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        debug!(collection, id = %id, deleted, "delete_one");
        Ok(deleted > 0)
    }

    /// Deletes every document in a collection. Returns the number of
    /// rows removed.
    pub fn delete_many(&self, collection: &str) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection],
        )?;
        debug!(collection, deleted, "delete_many");
        Ok(deleted)
    }

    async fn prepare_insert(
        &self,
        collection: &str,
        mut document: Value,
    ) -> StoreResult<(String, String)> {
        let Some(map) = document.as_object_mut() else {
            return Err(not_an_object());
        };
        let id = match map.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::now_v7().to_string();
                map.insert("_id".to_string(), Value::String(id.clone()));
                id
            }
        };
        let encrypted = self.engine.encrypt(collection, &document).await?;
        let body = serde_json::to_string(&encrypted)?;
        Ok((id, body))
    }
}

fn parse_row(body: &str) -> StoreResult<Value> {
    let mut document: Value = serde_json::from_str(body)?;
    narrow::decode_tree(&mut document);
    Ok(document)
}

fn not_an_object() -> StoreError {
    StoreError::InvalidDocument("document must be a JSON object".to_string())
}
