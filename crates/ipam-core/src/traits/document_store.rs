// # Document Store Trait
//
// Defines the interface for loading and saving configuration documents.
//
// ## Purpose
//
// Every read of a category file and every write of a merged or pruned file
// goes through a DocumentStore. The registry, the merge engine and the
// resource manager never touch the filesystem for documents directly.
//
// ## Load contract
//
// - Missing file: empty document, no error
// - Empty or comment-only file: empty document, no error
// - Syntax error: logged as a warning, empty document, no error
// - Any other read failure (permissions, not a file): error
//
// ## Implementations
//
// - `FileDocumentStore`: YAML files with header comments and atomic writes
// - `MemoryDocumentStore`: in-memory map, for tests and embedding

use async_trait::async_trait;
use std::path::Path;

use crate::config::{Environment, RecordCategory};
use crate::document::ConfigDocument;

/// Header written above a saved document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Category of the document (drives the header label)
    pub category: RecordCategory,
    /// Environment named in the header, if known
    pub environment: Option<Environment>,
    /// Keys listed on the "Recent additions" line (omitted when empty)
    pub recent_keys: Vec<String>,
}

impl DocumentHeader {
    /// Header for `category` without environment or recent keys
    pub fn new(category: RecordCategory) -> Self {
        Self {
            category,
            environment: None,
            recent_keys: Vec::new(),
        }
    }

    /// Name the environment in the header
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// List recently added keys
    pub fn with_recent_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recent_keys = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Trait for document store implementations
///
/// Implementations must be safe to share between tasks. The crate itself
/// drives them from a single task; there is no cross-process locking.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the document at `path`
    ///
    /// # Returns
    ///
    /// - `Ok(ConfigDocument)`: The document, empty when the file is missing,
    ///   empty or malformed
    /// - `Err(Error)`: The file exists but could not be read
    async fn load(&self, path: &Path) -> Result<ConfigDocument, crate::Error>;

    /// Save `document` to `path`, replacing any previous content
    ///
    /// The write must be all-or-nothing: an interrupted save leaves either
    /// the previous content or the new content at `path`.
    async fn save(
        &self,
        document: &ConfigDocument,
        path: &Path,
        header: &DocumentHeader,
    ) -> Result<(), crate::Error>;

    /// Whether a document exists at `path`
    async fn exists(&self, path: &Path) -> bool;
}
