//! Markdown merge report

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::Environment;
use crate::engine::{FileOutcome, FileResult, MergeFailure};
use crate::error::{Error, Result};
use crate::merge::MergeStrategy;

/// Summary of one merge run
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Target environment
    pub environment: Environment,
    /// Strategy used
    pub strategy: MergeStrategy,
    /// Local time the run finished, `YYYY-mm-dd HH:MM:SS`
    pub timestamp: String,
    /// Snapshot directory, if a backup was taken
    pub backup_path: Option<PathBuf>,
    /// Directory the merged files were written to
    pub target_dir: PathBuf,
    /// Nothing was written
    pub dry_run: bool,
    /// Per-file results in category order
    pub files: Vec<FileResult>,
}

impl MergeReport {
    /// No file failed
    pub fn is_success(&self) -> bool {
        !self
            .files
            .iter()
            .any(|f| matches!(f.outcome, FileOutcome::Failed(_)))
    }

    /// Error describing the first failed file, if any
    pub fn ensure_success(&self) -> Result<()> {
        for file in &self.files {
            if let FileOutcome::Failed(failure) = &file.outcome {
                return Err(match failure {
                    MergeFailure::NoData => {
                        Error::invalid_input(format!("No data found in {}", file.file_name))
                    }
                    MergeFailure::Conflicts(conflicts) => Error::OwnershipConflict {
                        file: file.file_name.clone(),
                        conflicts: conflicts.clone(),
                    },
                });
            }
        }
        Ok(())
    }

    /// Render as markdown
    pub fn render(&self) -> String {
        let backup = self
            .backup_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut out = String::new();
        let _ = writeln!(out, "# Backstage Merge Report");
        let _ = writeln!(out, "**Environment:** {}", self.environment);
        let _ = writeln!(out, "**Strategy:** {}", self.strategy);
        let _ = writeln!(out, "**Timestamp:** {}", self.timestamp);
        let _ = writeln!(out, "**Backup Location:** {}", backup);
        if self.dry_run {
            let _ = writeln!(out, "**Mode:** dry run (no files were written)");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "## Merge Results:");

        for file in &self.files {
            let _ = match &file.outcome {
                FileOutcome::Merged(stats) => writeln!(
                    out,
                    "- ✅ {}: Successfully merged ({} added, {} updated, {} kept)",
                    file.file_name, stats.added, stats.replaced, stats.kept
                ),
                FileOutcome::Failed(MergeFailure::NoData) => {
                    writeln!(out, "- ❌ {}: Merge failed (no data)", file.file_name)
                }
                FileOutcome::Failed(MergeFailure::Conflicts(conflicts)) => writeln!(
                    out,
                    "- ❌ {}: Merge failed ({} conflict(s))",
                    file.file_name,
                    conflicts.len()
                ),
                FileOutcome::Skipped => {
                    writeln!(out, "- ⏭️  {}: Skipped (not found)", file.file_name)
                }
            };
        }

        let conflicts: Vec<_> = self
            .files
            .iter()
            .flat_map(|f| f.outcome.conflicts().iter().map(move |c| (&f.file_name, c)))
            .collect();
        if !conflicts.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Conflicts:");
            for (file, conflict) in conflicts {
                let _ = writeln!(out, "- {}: {}", file, conflict);
            }
        }

        let target = self.target_dir.display();
        let _ = writeln!(out);
        let _ = writeln!(out, "## Next Steps:");
        let _ = writeln!(out, "1. Review the merged configurations in `{}/`", target);
        let _ = writeln!(
            out,
            "2. Test with Terragrunt plan: `cd live/{} && terragrunt plan`",
            self.environment
        );
        if !backup.is_empty() {
            let _ = writeln!(out, "3. If issues occur, restore from backup: `{}`", backup);
        }

        out
    }
}
