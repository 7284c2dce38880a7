//! BackstageId validation
//!
//! Identifiers have the form `<entity>-<environment>-<YYYYMMDDHHMMSS>`, for
//! example `my-app-dev-20250909120000`. The entity is lowercase
//! alphanumerics and hyphens, the environment is one of `dev`, `staging`,
//! `prod`, and the timestamp is exactly 14 ASCII digits. Matching is
//! case-sensitive and nothing is normalised; the timestamp is not checked
//! against the calendar.

use crate::config::Environment;
use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static BACKSTAGE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9-]+)-(dev|staging|prod)-([0-9]{14})$").expect("static regex is valid")
});

/// Human-readable description of the expected format
pub const EXPECTED_FORMAT: &str =
    "entity-environment-timestamp (e.g., my-app-dev-20250909120000)";

/// Check whether `id` is a well-formed BackstageId
pub fn is_valid(id: &str) -> bool {
    BACKSTAGE_ID.is_match(id)
}

/// A parsed BackstageId
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackstageId {
    entity: String,
    environment: Environment,
    timestamp: String,
}

impl BackstageId {
    /// Parse and split an identifier
    pub fn parse(id: &str) -> Result<Self> {
        let caps = BACKSTAGE_ID.captures(id).ok_or_else(|| {
            Error::invalid_input(format!(
                "Invalid Backstage ID format: {} (expected {})",
                id, EXPECTED_FORMAT
            ))
        })?;

        Ok(Self {
            entity: caps[1].to_string(),
            environment: caps[2].parse()?,
            timestamp: caps[3].to_string(),
        })
    }

    /// Entity segment
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Environment segment
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// `YYYYMMDDHHMMSS` segment
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl fmt::Display for BackstageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.entity, self.environment, self.timestamp)
    }
}

impl std::str::FromStr for BackstageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for id in [
            "my-app-dev-20250909120000",
            "web-service-prod-20251231235959",
            "api-gateway-staging-20250101000000",
            "a-dev-00000000000000",
        ] {
            assert!(is_valid(id), "should be valid: {}", id);
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for id in [
            "my-app-dev",
            "my-app-dev-2025090912000",
            "my-app-dev-202509091200000",
            "MyApp-dev-20250909120000",
            "my_app-dev-20250909120000",
            "my-app-invalid-20250909120000",
            "my-app-DEV-20250909120000",
            "dev-20250909120000",
            " my-app-dev-20250909120000",
            "my-app-dev-20250909120000\n",
        ] {
            assert!(!is_valid(id), "should be invalid: {:?}", id);
        }
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        assert!(!is_valid("my-app-dev-２０２５０９０９１２００００"));
    }

    #[test]
    fn test_parse_splits_segments() {
        let id = BackstageId::parse("old-app-staging-20250901120000").unwrap();
        assert_eq!(id.entity(), "old-app");
        assert_eq!(id.environment(), Environment::Staging);
        assert_eq!(id.timestamp(), "20250901120000");
        assert_eq!(id.to_string(), "old-app-staging-20250901120000");
    }

    #[test]
    fn test_parse_entity_may_contain_environment_words() {
        let id = BackstageId::parse("prod-mirror-dev-20250901120000").unwrap();
        assert_eq!(id.entity(), "prod-mirror");
        assert_eq!(id.environment(), Environment::Dev);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let err = BackstageId::parse("MyApp-dev-20250909120000").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
