//! Storage layer: an opaque sink/source for business documents keyed by `id`.

use arcyelp_core::Document;
use async_trait::async_trait;
use serde_json::Value;

mod error;
pub use error::StoreError;

mod file;
pub use file::JsonFileStore;

mod memory;
pub use memory::MemoryStore;

/// A container of JSON documents keyed by their `id` field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace each document. Returns how many were written.
    async fn upsert(&self, documents: &[Document]) -> Result<usize, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Every document, ordered by id.
    async fn list(&self) -> Result<Vec<Document>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}

/// The `id` a document is stored under.
pub fn document_id(document: &Document) -> Result<&str, StoreError> {
    document
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(StoreError::MissingId)
}
