//! Conflict resolution strategies
//!
//! [`resolve`] merges an incoming document into a copy of an existing one.
//! Keys that only exist in the incoming document are always added. For keys
//! present in both, the [`MergeStrategy`] decides whether the incoming entry
//! replaces the existing one.
//!
//! `fail-on-conflict` is enforced by the caller: when [`detect_conflicts`]
//! reports anything, the caller must not resolve at all. `resolve` has no
//! rule of its own for it and leaves shared keys untouched.
//!
//! Timestamp comparison is plain string ordering, so `CreatedAt` values are
//! expected to use one lexicographically sortable format.
//!
//! [`detect_conflicts`]: crate::conflict::detect_conflicts

use crate::document::{ConfigDocument, ResourceEntry};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How shared keys are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Incoming automation-owned entries replace; incoming manual entries never do
    #[default]
    BackstageWins,
    /// Existing manual entries are never replaced by automation-owned ones
    ManualProtected,
    /// The entry with the greater-or-equal `CreatedAt` wins
    TimestampWins,
    /// Refuse to merge a file with any conflict
    FailOnConflict,
}

impl MergeStrategy {
    /// All strategies
    pub const ALL: [MergeStrategy; 4] = [
        MergeStrategy::BackstageWins,
        MergeStrategy::ManualProtected,
        MergeStrategy::TimestampWins,
        MergeStrategy::FailOnConflict,
    ];

    /// Kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::BackstageWins => "backstage-wins",
            MergeStrategy::ManualProtected => "manual-protected",
            MergeStrategy::TimestampWins => "timestamp-wins",
            MergeStrategy::FailOnConflict => "fail-on-conflict",
        }
    }

    /// Whether detected conflicts abort the merge
    pub fn aborts_on_conflict(&self) -> bool {
        matches!(self, MergeStrategy::FailOnConflict)
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Unknown strategy '{}'. Expected one of: backstage-wins, \
                     manual-protected, timestamp-wins, fail-on-conflict",
                    s
                ))
            })
    }
}

/// What happened to one incoming key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Key was new and has been added
    Added,
    /// Existing entry replaced by the incoming one
    Replaced,
    /// Existing entry kept, incoming entry dropped
    Kept,
}

/// Decision for one incoming key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDecision {
    /// Resource key
    pub key: String,
    /// Outcome
    pub decision: Decision,
}

/// Result of [`resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged document
    pub merged: ConfigDocument,
    /// One decision per incoming key, in incoming order
    pub decisions: Vec<KeyDecision>,
}

impl MergeOutcome {
    /// Number of keys with the given decision
    pub fn count(&self, decision: Decision) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.decision == decision)
            .count()
    }
}

/// Merge `incoming` into a copy of `existing` using `strategy`
pub fn resolve(
    existing: &ConfigDocument,
    incoming: &ConfigDocument,
    strategy: MergeStrategy,
) -> MergeOutcome {
    let mut merged = existing.clone();
    let mut decisions = Vec::with_capacity(incoming.len());

    for (key, new_entry) in incoming.iter() {
        let decision = match existing.get(key) {
            None => {
                tracing::info!(
                    "Added new resource: {} ({})",
                    key,
                    new_entry.backstage_id().unwrap_or(key)
                );
                Decision::Added
            }
            Some(old_entry) => {
                let replace = should_replace(old_entry, new_entry, strategy);
                log_shared_key(key, new_entry, strategy, replace);
                if replace {
                    Decision::Replaced
                } else {
                    Decision::Kept
                }
            }
        };

        if decision != Decision::Kept {
            merged.insert(key, new_entry.clone());
        }
        decisions.push(KeyDecision {
            key: key.to_string(),
            decision,
        });
    }

    MergeOutcome { merged, decisions }
}

fn should_replace(existing: &ResourceEntry, incoming: &ResourceEntry, strategy: MergeStrategy) -> bool {
    match strategy {
        MergeStrategy::BackstageWins => incoming.is_automation_owned(),
        // Only manual -> automation is blocked
        MergeStrategy::ManualProtected => {
            existing.is_automation_owned() || !incoming.is_automation_owned()
        }
        MergeStrategy::TimestampWins => {
            incoming.tags().created_at_or_epoch() >= existing.tags().created_at_or_epoch()
        }
        MergeStrategy::FailOnConflict => false,
    }
}

fn log_shared_key(key: &str, incoming: &ResourceEntry, strategy: MergeStrategy, replaced: bool) {
    match (strategy, replaced) {
        (MergeStrategy::BackstageWins, true) => tracing::info!(
            "Updated Backstage resource: {} ({})",
            key,
            incoming.backstage_id().unwrap_or_default()
        ),
        (MergeStrategy::BackstageWins, false) => {
            tracing::debug!("Kept existing resource (incoming is manual): {}", key)
        }
        (MergeStrategy::ManualProtected, true) => tracing::info!("Updated resource: {}", key),
        (MergeStrategy::ManualProtected, false) => {
            tracing::warn!("Skipping overwrite of manual resource: {}", key)
        }
        (MergeStrategy::TimestampWins, true) => {
            tracing::info!("Updated resource (newer): {}", key)
        }
        (MergeStrategy::TimestampWins, false) => {
            tracing::info!("Skipped resource (older): {}", key)
        }
        (MergeStrategy::FailOnConflict, _) => {
            tracing::debug!("Kept existing resource: {}", key)
        }
    }
}
