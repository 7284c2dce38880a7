//! Error types for the IPAM sync system
//!
//! This module defines all error types used throughout the crate.

use crate::conflict::Conflict;
use thiserror::Error;

/// Result type alias for IPAM sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the IPAM sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store errors (reading, writing, renaming files)
    #[error("Document store error: {0}")]
    DocumentStore(String),

    /// Identifier, category or resource key not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Merge refused because ownership conflicts were detected
    #[error("{} ownership conflict(s) in {file}", conflicts.len())]
    OwnershipConflict {
        /// File the conflicts were detected in
        file: String,
        /// Detected conflicts
        conflicts: Vec<Conflict>,
    },

    /// The same BackstageId was found on two different resources
    #[error("BackstageId '{backstage_id}' is declared by both {first} and {second}")]
    DuplicateIdentifier {
        /// The duplicated identifier
        backstage_id: String,
        /// `<source_file>:<resource_key>` of the first occurrence
        first: String,
        /// `<source_file>:<resource_key>` of the occurrence that replaced it
        second: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a document store error
    pub fn document_store(msg: impl Into<String>) -> Self {
        Self::DocumentStore(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns `true` for [`Error::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictKind;

    #[test]
    fn test_ownership_conflict_message_counts_conflicts() {
        let err = Error::OwnershipConflict {
            file: "a-records.yaml".to_string(),
            conflicts: vec![Conflict {
                key: "web".to_string(),
                kind: ConflictKind::ManualOverwriteAttempt {
                    incoming_id: "web-dev-20250101000000".to_string(),
                },
            }],
        };

        assert_eq!(err.to_string(), "1 ownership conflict(s) in a-records.yaml");
    }

    #[test]
    fn test_not_found_helper() {
        let err = Error::not_found("missing-dev-20250101000000");
        assert!(err.is_not_found());
        assert!(!Error::config("bad").is_not_found());
    }
}
