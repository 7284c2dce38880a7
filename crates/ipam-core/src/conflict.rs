//! Ownership conflict detection
//!
//! A conflict is a key present in both the existing and the incoming
//! document where applying the incoming entry would silently replace a
//! resource owned by someone else:
//!
//! | existing id | incoming id | result                     |
//! |-------------|-------------|----------------------------|
//! | `a`         | `b` (≠ `a`) | identifier mismatch        |
//! | none        | `b`         | manual overwrite attempt   |
//! | `a`         | `a`         | no conflict                |
//! | `a`         | none        | no conflict                |
//! | none        | none        | no conflict                |

use crate::document::ConfigDocument;
use serde::Serialize;
use std::fmt;

/// Kind of ownership conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Both entries are automation-owned with different identifiers
    IdentifierMismatch {
        /// BackstageId already in the target file
        existing_id: String,
        /// BackstageId of the incoming entry
        incoming_id: String,
    },
    /// A manual entry would be replaced by an automation-owned one
    ManualOverwriteAttempt {
        /// BackstageId of the incoming entry
        incoming_id: String,
    },
}

/// One detected conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// Resource key shared by both documents
    pub key: String,
    /// What collides
    #[serde(flatten)]
    pub kind: ConflictKind,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConflictKind::IdentifierMismatch {
                existing_id,
                incoming_id,
            } => write!(
                f,
                "Resource '{}': Existing BackstageId '{}' vs New BackstageId '{}'",
                self.key, existing_id, incoming_id
            ),
            ConflictKind::ManualOverwriteAttempt { incoming_id } => write!(
                f,
                "Resource '{}': Attempting to overwrite manual resource with Backstage resource '{}'",
                self.key, incoming_id
            ),
        }
    }
}

/// Detect conflicts between `existing` and `incoming`
///
/// Conflicts are returned in incoming-document order. Neither document is
/// modified.
pub fn detect_conflicts(existing: &ConfigDocument, incoming: &ConfigDocument) -> Vec<Conflict> {
    incoming
        .iter()
        .filter_map(|(key, new_entry)| {
            let old_entry = existing.get(key)?;
            let kind = match (old_entry.backstage_id(), new_entry.backstage_id()) {
                (Some(eid), Some(nid)) if eid != nid => ConflictKind::IdentifierMismatch {
                    existing_id: eid.to_string(),
                    incoming_id: nid.to_string(),
                },
                (None, Some(nid)) => ConflictKind::ManualOverwriteAttempt {
                    incoming_id: nid.to_string(),
                },
                _ => return None,
            };
            Some(Conflict {
                key: key.to_string(),
                kind,
            })
        })
        .collect()
}
