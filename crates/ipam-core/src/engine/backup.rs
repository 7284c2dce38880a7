//! Pre-merge snapshots
//!
//! Before a merge touches an environment, every existing category file is
//! copied byte-for-byte into `<backup_root>/merge_<YYYYmmdd_HHMMSS>/`.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Error, Result};

/// A completed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Directory holding the copies
    pub dir: PathBuf,
    /// File names that were copied
    pub files: Vec<String>,
}

/// Directory name of a snapshot taken at `stamp` (`YYYYmmdd_HHMMSS`)
pub fn snapshot_dir_name(stamp: &str) -> String {
    format!("merge_{}", stamp)
}

/// Copy each of `file_names` that exists in `source_dir` into a new
/// snapshot directory under `backup_root`
///
/// The snapshot directory is created even when there is nothing to copy.
pub async fn create_snapshot(
    source_dir: &Path,
    backup_root: &Path,
    file_names: &[String],
    stamp: &str,
) -> Result<Snapshot> {
    let dir = backup_root.join(snapshot_dir_name(stamp));
    fs::create_dir_all(&dir).await.map_err(|e| {
        Error::document_store(format!(
            "Failed to create backup directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut files = Vec::new();
    for name in file_names {
        let src = source_dir.join(name);
        if !fs::try_exists(&src).await.unwrap_or(false) {
            continue;
        }
        let dst = dir.join(name);
        fs::copy(&src, &dst).await.map_err(|e| {
            Error::document_store(format!(
                "Failed to back up {} to {}: {}",
                src.display(),
                dst.display(),
                e
            ))
        })?;
        tracing::info!("Backed up {}", name);
        files.push(name.clone());
    }

    Ok(Snapshot { dir, files })
}
