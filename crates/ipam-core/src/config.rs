//! Configuration types for the IPAM sync system
//!
//! Every component receives its paths through these types; nothing in the
//! library resolves paths against the process working directory.

use crate::merge::MergeStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Repository root holding `live/<env>/configs` and `backups/`
    pub root_path: PathBuf,

    /// Target environment
    pub environment: Environment,

    /// File name used for each record category
    #[serde(default)]
    pub category_file_names: CategoryFileNames,

    /// Merge behaviour
    #[serde(default)]
    pub merge: MergeSettings,

    /// Registry behaviour
    #[serde(default)]
    pub registry: RegistrySettings,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new(root_path: impl Into<PathBuf>, environment: Environment) -> Self {
        Self {
            root_path: root_path.into(),
            environment,
            category_file_names: CategoryFileNames::default(),
            merge: MergeSettings::default(),
            registry: RegistrySettings::default(),
        }
    }

    /// Set the merge strategy
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge.strategy = strategy;
        self
    }

    /// Directory holding the category files of the target environment
    pub fn env_config_dir(&self) -> PathBuf {
        self.root_path
            .join("live")
            .join(self.environment.as_str())
            .join("configs")
    }

    /// Directory under which timestamped backups are created
    pub fn backup_root(&self) -> PathBuf {
        self.root_path.join("backups")
    }

    /// Path of `category`'s file inside `dir`
    pub fn category_path(&self, dir: &Path, category: RecordCategory) -> PathBuf {
        dir.join(self.category_file_names.file_name(category))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.root_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Root path cannot be empty"));
        }

        self.category_file_names.validate()?;

        if let Some(report) = &self.merge.report_path
            && report.as_os_str().is_empty()
        {
            return Err(crate::Error::config("Report path cannot be empty"));
        }

        Ok(())
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development
    Dev,
    /// Staging
    Staging,
    /// Production
    Prod,
}

impl Environment {
    /// All environments
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Staging, Environment::Prod];

    /// Literal used in directory names and identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }

    /// Capitalised name used in file headers
    pub fn title(&self) -> &'static str {
        match self {
            Environment::Dev => "Dev",
            Environment::Staging => "Staging",
            Environment::Prod => "Prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| {
                crate::Error::invalid_input(format!(
                    "Environment must be one of: dev, staging, prod (got '{}')",
                    s
                ))
            })
    }
}

/// Record category, one document per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordCategory {
    /// A records
    ARecords,
    /// CNAME records
    CnameRecords,
    /// Host records
    HostRecords,
    /// Networks
    Networks,
    /// Authoritative DNS zones
    DnsZones,
}

impl RecordCategory {
    /// All categories in processing order
    pub const ALL: [RecordCategory; 5] = [
        RecordCategory::ARecords,
        RecordCategory::CnameRecords,
        RecordCategory::HostRecords,
        RecordCategory::Networks,
        RecordCategory::DnsZones,
    ];

    /// Stable slug, e.g. `a-records`
    pub fn slug(&self) -> &'static str {
        match self {
            RecordCategory::ARecords => "a-records",
            RecordCategory::CnameRecords => "cname-records",
            RecordCategory::HostRecords => "host-records",
            RecordCategory::Networks => "networks",
            RecordCategory::DnsZones => "dns-zones",
        }
    }

    /// Label used in the saved file header
    pub fn label(&self) -> &'static str {
        match self {
            RecordCategory::ARecords => "A",
            RecordCategory::CnameRecords => "CNAME",
            RecordCategory::HostRecords => "Host",
            RecordCategory::Networks => "Network",
            RecordCategory::DnsZones => "DNS Zone",
        }
    }

    /// Default file name, e.g. `a-records.yaml`
    pub fn default_file_name(&self) -> String {
        format!("{}.yaml", self.slug())
    }

    /// Parse a slug
    pub fn from_slug(slug: &str) -> Option<Self> {
        RecordCategory::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for RecordCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordCategory::from_slug(s)
            .ok_or_else(|| crate::Error::invalid_input(format!("Unknown record category: {}", s)))
    }
}

/// Category → file name table
///
/// Categories missing from a deserialized table fall back to
/// [`RecordCategory::default_file_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryFileNames {
    names: BTreeMap<RecordCategory, String>,
}

impl CategoryFileNames {
    /// Override the file name of one category
    pub fn with(mut self, category: RecordCategory, file_name: impl Into<String>) -> Self {
        self.names.insert(category, file_name.into());
        self
    }

    /// File name for `category`
    pub fn file_name(&self, category: RecordCategory) -> String {
        self.names
            .get(&category)
            .cloned()
            .unwrap_or_else(|| category.default_file_name())
    }

    /// Reverse lookup
    pub fn category_for(&self, file_name: &str) -> Option<RecordCategory> {
        RecordCategory::ALL
            .into_iter()
            .find(|c| self.file_name(*c) == file_name)
    }

    /// File names must be non-empty, plain names and distinct
    pub fn validate(&self) -> Result<(), crate::Error> {
        let mut seen = BTreeMap::new();
        for category in RecordCategory::ALL {
            let name = self.file_name(category);
            if name.is_empty() {
                return Err(crate::Error::config(format!(
                    "File name for {} cannot be empty",
                    category
                )));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(crate::Error::config(format!(
                    "File name for {} must not contain a path separator: {}",
                    category, name
                )));
            }
            if let Some(other) = seen.insert(name.clone(), category) {
                return Err(crate::Error::config(format!(
                    "{} and {} share the file name {}",
                    other, category, name
                )));
            }
        }
        Ok(())
    }
}

impl Default for CategoryFileNames {
    fn default() -> Self {
        Self {
            names: RecordCategory::ALL
                .into_iter()
                .map(|c| (c, c.default_file_name()))
                .collect(),
        }
    }
}

/// Merge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Conflict resolution strategy
    #[serde(default)]
    pub strategy: MergeStrategy,

    /// Snapshot target files before merging
    #[serde(default = "default_backup")]
    pub backup: bool,

    /// Resolve and report without writing anything
    #[serde(default)]
    pub dry_run: bool,

    /// Where to write the markdown merge report (not written when unset)
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            strategy: MergeStrategy::default(),
            backup: default_backup(),
            dry_run: false,
            report_path: None,
        }
    }
}

fn default_backup() -> bool {
    true
}

/// Registry settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Reject duplicate BackstageIds instead of letting the last one win
    #[serde(default)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_dir_layout() {
        let config = SyncConfig::new("/repo", Environment::Staging);
        assert_eq!(
            config.env_config_dir(),
            PathBuf::from("/repo/live/staging/configs")
        );
        assert_eq!(config.backup_root(), PathBuf::from("/repo/backups"));
        assert_eq!(
            config.category_path(Path::new("/x"), RecordCategory::DnsZones),
            PathBuf::from("/x/dns-zones.yaml")
        );
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("Prod".parse::<Environment>().is_err());
        assert!("test-env".parse::<Environment>().is_err());
    }

    #[test]
    fn test_category_file_name_overrides() {
        let names = CategoryFileNames::default().with(RecordCategory::Networks, "nets.yml");
        assert_eq!(names.file_name(RecordCategory::Networks), "nets.yml");
        assert_eq!(names.file_name(RecordCategory::ARecords), "a-records.yaml");
        assert_eq!(names.category_for("nets.yml"), Some(RecordCategory::Networks));
        assert_eq!(names.category_for("networks.yaml"), None);
    }

    #[test]
    fn test_partial_table_deserializes_with_defaults() {
        let names: CategoryFileNames =
            serde_json::from_str(r#"{"host-records": "hosts.yaml"}"#).unwrap();
        assert_eq!(names.file_name(RecordCategory::HostRecords), "hosts.yaml");
        assert_eq!(names.file_name(RecordCategory::CnameRecords), "cname-records.yaml");
    }

    #[test]
    fn test_validate_rejects_shared_file_names() {
        let mut config = SyncConfig::new("/repo", Environment::Dev);
        config.category_file_names = CategoryFileNames::default()
            .with(RecordCategory::ARecords, "records.yaml")
            .with(RecordCategory::HostRecords, "records.yaml");
        assert!(config.validate().is_err());

        config.category_file_names =
            CategoryFileNames::default().with(RecordCategory::ARecords, "../a.yaml");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_settings_defaults() {
        let settings: MergeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.strategy, MergeStrategy::BackstageWins);
        assert!(settings.backup);
        assert!(!settings.dry_run);
        assert!(settings.report_path.is_none());
    }
}
