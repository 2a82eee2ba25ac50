//! One-file-per-document store on local disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use arcyelp_core::Document;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::{DocumentStore, StoreError, document_id};

/// Stores each document as `<id>.json` inside a container directory.
///
/// Survives process restarts. Writes to the same id are last-writer-wins.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open the container at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "opened document container");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let usable = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\', '\0']);
        if !usable {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.json")))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn upsert(&self, documents: &[Document]) -> Result<usize, StoreError> {
        let mut targets = Vec::with_capacity(documents.len());
        for doc in documents {
            targets.push((self.path_for(document_id(doc)?)?, serde_json::to_vec_pretty(doc)?));
        }

        for (path, bytes) in &targets {
            tokio::fs::write(path, bytes).await?;
        }
        info!(count = targets.len(), root = %self.root.display(), "wrote documents");
        Ok(targets.len())
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let path = self.path_for(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(parse_document(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        let mut keyed = Vec::with_capacity(paths.len());
        for path in paths {
            let doc = parse_document(&tokio::fs::read(&path).await?)?;
            keyed.push((document_id(&doc)?.to_string(), doc));
        }
        // File names do not sort like ids ("a-b.json" < "a.json").
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, doc)| doc).collect())
    }
}

fn parse_document(bytes: &[u8]) -> Result<Document, StoreError> {
    match serde_json::from_slice(bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Other("stored document is not a JSON object".into())),
    }
}
