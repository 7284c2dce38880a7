//! Merge engine
//!
//! The MergeEngine reconciles the authoring tool's staging output with the
//! category files of one environment:
//! - Snapshotting the target files before anything is written
//! - Detecting ownership conflicts per file
//! - Resolving shared keys with the configured strategy
//! - Saving merged documents through the DocumentStore
//! - Summarising the run in a markdown report
//!
//! ## Flow
//!
//! ```text
//!   staging/<category>.yaml          live/<env>/configs/<category>.yaml
//!            │                                    │
//!            └──────────────┬─────────────────────┘
//!                           ▼
//!                  ┌──────────────────┐
//!                  │ detect_conflicts │── fail-on-conflict ──▶ Failed
//!                  └──────────────────┘
//!                           │
//!                           ▼
//!                  ┌──────────────────┐
//!                  │     resolve      │
//!                  └──────────────────┘
//!                           │
//!                           ▼
//!                  DocumentStore::save ──────────────────────▶ Merged
//! ```
//!
//! Failures of individual files are recorded in the report and do not stop
//! the remaining categories. I/O errors do.

pub mod backup;
pub mod report;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{RecordCategory, SyncConfig};
use crate::conflict::{detect_conflicts, Conflict};
use crate::error::Result;
use crate::merge::{resolve, Decision};
use crate::traits::{DocumentHeader, DocumentStore};

pub use backup::Snapshot;
pub use report::MergeReport;

/// Counts for a merged file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Keys new to the target
    pub added: usize,
    /// Shared keys taken from the incoming document
    pub replaced: usize,
    /// Shared keys left as they were
    pub kept: usize,
    /// Conflicts detected (and tolerated by the strategy)
    pub conflicts: Vec<Conflict>,
}

/// Why a file was not merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeFailure {
    /// The staging file held no entries
    NoData,
    /// Conflicts under `fail-on-conflict`
    Conflicts(Vec<Conflict>),
}

/// Result for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// Target written (or would have been, in dry-run)
    Merged(MergeStats),
    /// Target left untouched
    Failed(MergeFailure),
    /// No staging file for this category
    Skipped,
}

impl FileOutcome {
    /// Conflicts attached to this outcome, tolerated or fatal
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            FileOutcome::Merged(stats) => &stats.conflicts,
            FileOutcome::Failed(MergeFailure::Conflicts(conflicts)) => conflicts,
            _ => &[],
        }
    }
}

/// Outcome of one category file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    /// Category
    pub category: RecordCategory,
    /// File name in both staging and target directories
    pub file_name: String,
    /// What happened
    pub outcome: FileOutcome,
}

/// Merge engine for one environment
pub struct MergeEngine<S: DocumentStore> {
    store: S,
    config: SyncConfig,
}

impl<S: DocumentStore> MergeEngine<S> {
    /// Create a new engine
    ///
    /// Fails if the configuration does not validate.
    pub fn new(store: S, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Configuration in use
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Underlying document store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Directory merged files are written to
    pub fn target_dir(&self) -> PathBuf {
        self.config.env_config_dir()
    }

    fn file_names(&self) -> Vec<String> {
        RecordCategory::ALL
            .into_iter()
            .map(|c| self.config.category_file_names.file_name(c))
            .collect()
    }

    /// Snapshot the environment's category files
    pub async fn create_backup(&self) -> Result<Snapshot> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let snapshot = backup::create_snapshot(
            &self.target_dir(),
            &self.config.backup_root(),
            &self.file_names(),
            &stamp,
        )
        .await?;
        info!(
            "Created backup at {} ({} file(s))",
            snapshot.dir.display(),
            snapshot.files.len()
        );
        Ok(snapshot)
    }

    /// Merge the staging document at `source` into the target file of
    /// `category`
    pub async fn merge_file(&self, source: &Path, category: RecordCategory) -> Result<FileOutcome> {
        let incoming = self.store.load(source).await?;
        if incoming.is_empty() {
            warn!("No data found in {}", source.display());
            return Ok(FileOutcome::Failed(MergeFailure::NoData));
        }

        let target = self.config.category_path(&self.target_dir(), category);
        let existing = self.store.load(&target).await?;
        debug!(
            "Merging {} ({} incoming, {} existing) into {}",
            source.display(),
            incoming.len(),
            existing.len(),
            target.display()
        );

        let conflicts = detect_conflicts(&existing, &incoming);
        if !conflicts.is_empty() {
            warn!(
                "Found {} conflict(s) in {}",
                conflicts.len(),
                target.display()
            );
            for conflict in &conflicts {
                warn!("  - {}", conflict);
            }
        }

        let strategy = self.config.merge.strategy;
        if !conflicts.is_empty() && strategy.aborts_on_conflict() {
            error!(
                "Merge aborted for {} due to conflicts (strategy: {})",
                target.display(),
                strategy
            );
            return Ok(FileOutcome::Failed(MergeFailure::Conflicts(conflicts)));
        }

        let outcome = resolve(&existing, &incoming, strategy);
        let stats = MergeStats {
            added: outcome.count(Decision::Added),
            replaced: outcome.count(Decision::Replaced),
            kept: outcome.count(Decision::Kept),
            conflicts,
        };

        if self.config.merge.dry_run {
            info!(
                "Dry run: would write {} resource(s) to {}",
                outcome.merged.len(),
                target.display()
            );
        } else {
            let header = DocumentHeader::new(category)
                .with_environment(self.config.environment)
                .with_recent_keys(incoming.keys());
            self.store.save(&outcome.merged, &target, &header).await?;
            info!(
                "Merged {} into {} ({} added, {} updated, {} kept)",
                source.display(),
                target.display(),
                stats.added,
                stats.replaced,
                stats.kept
            );
        }

        Ok(FileOutcome::Merged(stats))
    }

    /// Merge every category found in `source_dir`, in category order
    pub async fn merge_all(&self, source_dir: &Path) -> Result<Vec<FileResult>> {
        let mut results = Vec::with_capacity(RecordCategory::ALL.len());

        for category in RecordCategory::ALL {
            let file_name = self.config.category_file_names.file_name(category);
            let source = source_dir.join(&file_name);

            let outcome = if self.store.exists(&source).await {
                self.merge_file(&source, category).await?
            } else {
                debug!("No staging file for {}: {}", category, source.display());
                FileOutcome::Skipped
            };

            results.push(FileResult {
                category,
                file_name,
                outcome,
            });
        }

        Ok(results)
    }

    /// Backup, merge everything in `source_dir` and write the report
    ///
    /// In dry-run mode neither the backup nor the report is written.
    pub async fn run(&self, source_dir: &Path) -> Result<MergeReport> {
        let dry_run = self.config.merge.dry_run;
        info!(
            "Merging {} into {} (strategy: {}{})",
            source_dir.display(),
            self.config.environment,
            self.config.merge.strategy,
            if dry_run { ", dry run" } else { "" }
        );

        let backup_path = if self.config.merge.backup && !dry_run {
            Some(self.create_backup().await?.dir)
        } else {
            None
        };

        let files = self.merge_all(source_dir).await?;

        let report = MergeReport {
            environment: self.config.environment,
            strategy: self.config.merge.strategy,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            backup_path,
            target_dir: self.target_dir(),
            dry_run,
            files,
        };

        if !dry_run && let Some(path) = &self.config.merge.report_path {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, report.render()).await?;
            info!("Merge report written to {}", path.display());
        }

        Ok(report)
    }
}
