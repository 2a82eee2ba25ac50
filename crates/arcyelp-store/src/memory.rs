use std::collections::BTreeMap;

use arcyelp_core::Document;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{DocumentStore, StoreError, document_id};

/// Process-lifetime store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(&self, documents: &[Document]) -> Result<usize, StoreError> {
        // Validate first so a bad document leaves the store untouched.
        let keyed = documents
            .iter()
            .map(|doc| Ok((document_id(doc)?.to_string(), doc.clone())))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut map = self.documents.write().await;
        map.extend(keyed);
        debug!(count = documents.len(), total = map.len(), "upserted documents");
        Ok(documents.len())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.documents.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.documents.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let store = MemoryStore::new();
        let written = store
            .upsert(&[doc(json!({"id": "a", "name": "Alpha"}))])
            .await
            .unwrap();
        assert_eq!(written, 1);

        let got = store.get("a").await.unwrap().unwrap();
        assert_eq!(got["name"], "Alpha");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let store = MemoryStore::new();
        store.upsert(&[doc(json!({"id": "a", "v": 1}))]).await.unwrap();
        store.upsert(&[doc(json!({"id": "a", "v": 2}))]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("a").await.unwrap().unwrap()["v"], 2);
    }

    #[tokio::test]
    async fn list_orders_by_id() {
        let store = MemoryStore::new();
        store
            .upsert(&[doc(json!({"id": "b"})), doc(json!({"id": "a"}))])
            .await
            .unwrap();
        let ids: Vec<Value> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn missing_id_rejects_whole_batch() {
        let store = MemoryStore::new();
        let result = store
            .upsert(&[doc(json!({"id": "a"})), doc(json!({"name": "no id"}))])
            .await;
        assert!(matches!(result, Err(StoreError::MissingId)));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
