// # Memory Document Store
//
// In-memory implementation of DocumentStore.
//
// ## Purpose
//
// Holds documents in a map keyed by path. Nothing touches the disk, which
// makes it the store of choice for tests and for embedding the merge logic
// in tools that manage persistence themselves.
//
// Saved headers are recorded next to the documents so callers can inspect
// what a file store would have written.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::document::ConfigDocument;
use crate::traits::document_store::{DocumentHeader, DocumentStore};

#[derive(Debug, Default)]
struct Slot {
    document: ConfigDocument,
    header: Option<DocumentHeader>,
}

/// In-memory document store
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<RwLock<HashMap<PathBuf, Slot>>>,
}

impl MemoryDocumentStore {
    /// Create a new empty memory document store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without recording a header
    pub async fn insert(&self, path: impl Into<PathBuf>, document: ConfigDocument) {
        let mut guard = self.inner.write().await;
        guard.insert(
            path.into(),
            Slot {
                document,
                header: None,
            },
        );
    }

    /// Header of the last save to `path`
    pub async fn header(&self, path: &Path) -> Option<DocumentHeader> {
        let guard = self.inner.read().await;
        guard.get(path).and_then(|slot| slot.header.clone())
    }

    /// Paths currently held
    pub async fn paths(&self) -> Vec<PathBuf> {
        let guard = self.inner.read().await;
        let mut paths: Vec<PathBuf> = guard.keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, path: &Path) -> Result<ConfigDocument, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(path)
            .map(|slot| slot.document.clone())
            .unwrap_or_default())
    }

    async fn save(
        &self,
        document: &ConfigDocument,
        path: &Path,
        header: &DocumentHeader,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(
            path.to_path_buf(),
            Slot {
                document: document.clone(),
                header: Some(header.clone()),
            },
        );
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        let guard = self.inner.read().await;
        guard.contains_key(path)
    }
}
