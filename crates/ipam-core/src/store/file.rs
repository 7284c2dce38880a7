// # File Document Store
//
// YAML file implementation of DocumentStore.
//
// ## File Format
//
// ```yaml
// # A Records - Dev Environment
// # Last updated: 2025-09-09 12:00:00
// # Managed by Terraform and Backstage
// # Recent additions: my_app_api, my_app_web
//
// my_app_api:
//   fqdn: api.my-app.example.com
//   ip_addr: 10.0.1.10
//   ea_tags:
//     CreatedBy: backstage
//     BackstageId: my-app-dev-20250909120000
// ```
//
// Header lines are YAML comments and carry no data. An empty document is
// written as the single line `# No records configured`.
//
// ## Crash Safety
//
// - Atomic writes: content goes to `<file>.tmp`, is synced, then renamed
//   over the target
// - Tolerant loads: a file that does not parse is reported and treated as
//   empty so callers can continue with a safe default

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::document::ConfigDocument;
use crate::traits::document_store::{DocumentHeader, DocumentStore};

/// Descriptive header lines that earlier tooling wrote into environment files
static ENVIRONMENT_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# Environment:.*$").expect("static regex is valid"));

/// Third header line of every saved file
pub const MANAGED_BY_NOTICE: &str = "# Managed by Terraform and Backstage";

/// Body written for an empty document
pub const EMPTY_DOCUMENT_NOTICE: &str = "# No records configured";

/// File-based document store
///
/// # Example
///
/// ```rust,no_run
/// use ipam_core::config::RecordCategory;
/// use ipam_core::store::FileDocumentStore;
/// use ipam_core::traits::{DocumentHeader, DocumentStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileDocumentStore::new();
///     let path = std::path::Path::new("live/dev/configs/a-records.yaml");
///
///     let mut doc = store.load(path).await?;
///     doc.remove("stale_record");
///     store
///         .save(&doc, path, &DocumentHeader::new(RecordCategory::ARecords))
///         .await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileDocumentStore;

impl FileDocumentStore {
    /// Create a file document store
    pub fn new() -> Self {
        Self
    }

    /// Path of the temporary file used for atomic writes
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

/// Remove `# Environment:` comment lines, leaving the line breaks in place
pub fn strip_environment_comments(content: &str) -> std::borrow::Cow<'_, str> {
    ENVIRONMENT_COMMENT.replace_all(content, "")
}

/// Render a document with its header, as written by [`FileDocumentStore::save`]
///
/// `updated_at` is the text placed on the "Last updated" line.
pub fn render_document(
    document: &ConfigDocument,
    header: &DocumentHeader,
    updated_at: &str,
) -> Result<String, Error> {
    let mut out = String::new();

    match header.environment {
        Some(env) => out.push_str(&format!(
            "# {} Records - {} Environment\n",
            header.category.label(),
            env.title()
        )),
        None => out.push_str(&format!("# {} Records\n", header.category.label())),
    }
    out.push_str(&format!("# Last updated: {}\n", updated_at));
    out.push_str(MANAGED_BY_NOTICE);
    out.push('\n');

    if !header.recent_keys.is_empty() {
        out.push_str(&format!(
            "# Recent additions: {}\n",
            header.recent_keys.join(", ")
        ));
    }

    out.push('\n');

    if document.is_empty() {
        out.push_str(EMPTY_DOCUMENT_NOTICE);
        out.push('\n');
    } else {
        out.push_str(&document.to_yaml_string()?);
    }

    Ok(out)
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, path: &Path) -> Result<ConfigDocument, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Document does not exist: {}", path.display());
                return Ok(ConfigDocument::new());
            }
            Err(e) => {
                return Err(Error::document_store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let content = strip_environment_comments(&content);

        match ConfigDocument::from_yaml_str(&content) {
            Ok(document) => {
                tracing::debug!(
                    "Loaded {}: {} resource(s)",
                    path.display(),
                    document.len()
                );
                Ok(document)
            }
            Err(e) => {
                tracing::warn!(
                    "Error parsing {}: {}. Treating it as an empty document.",
                    path.display(),
                    e
                );
                Ok(ConfigDocument::new())
            }
        }
    }

    async fn save(
        &self,
        document: &ConfigDocument,
        path: &Path,
        header: &DocumentHeader,
    ) -> Result<(), Error> {
        let updated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let content = render_document(document, header, &updated_at)?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::document_store(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Write to temporary file first
        let temp_path = Self::temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::document_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(content.as_bytes()).await.map_err(|e| {
                Error::document_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::document_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::document_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            "Saved {} resource(s) to {}",
            document.len(),
            path.display()
        );
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}
