//! Registry of Backstage-managed resources
//!
//! The registry indexes every automation-owned entry of a set of category
//! documents by its BackstageId. It is a derived, read-only view: it is
//! rebuilt from the documents whenever it is needed and never persisted.
//!
//! An entry is registered when its tags carry `CreatedBy: backstage` and a
//! non-empty `BackstageId`. When the same identifier appears more than once
//! the later occurrence replaces the earlier one; every such collision is
//! kept as a [`DuplicateIdentifier`] diagnostic and can be turned into an
//! error with [`ResourceRegistry::ensure_unique`].
//!
//! ## Usage
//!
//! ```rust
//! use ipam_core::config::RecordCategory;
//! use ipam_core::document::ConfigDocument;
//! use ipam_core::registry::ResourceRegistry;
//!
//! let a_records = ConfigDocument::from_yaml_str(
//!     "api:\n  fqdn: api.example.com\n  ip_addr: 10.0.0.1\n  ea_tags:\n    CreatedBy: backstage\n    BackstageId: api-dev-20250101000000\n    BackstageEntity: api\n",
//! )
//! .unwrap();
//!
//! let registry = ResourceRegistry::build([(RecordCategory::ARecords, &a_records)]);
//! assert_eq!(registry.find_by_entity("api").len(), 1);
//! assert!(registry.find_by_entity("ap").is_empty());
//! assert_eq!(registry.list(Some("ap")).len(), 1);
//! ```

use crate::config::RecordCategory;
use crate::document::{ConfigDocument, ResourceEntry, is_truthy};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Record type inferred from the fields of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// `ip_addr` + `fqdn`
    A,
    /// `ip_addr` + `fqdn` with a truthy `allocate_ip`
    Host,
    /// `alias` + `canonical`
    Cname,
    /// `network`
    Network,
    /// None of the above
    Unknown,
}

impl RecordType {
    /// Uppercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Host => "HOST",
            RecordType::Cname => "CNAME",
            RecordType::Network => "NETWORK",
            RecordType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infer the record type of an entry from which fields are present
///
/// Checked in order: `ip_addr`+`fqdn`, `alias`+`canonical`, `network`.
pub fn record_type(entry: &ResourceEntry) -> RecordType {
    if entry.has_field("ip_addr") && entry.has_field("fqdn") {
        if entry.field("allocate_ip").is_some_and(is_truthy) {
            RecordType::Host
        } else {
            RecordType::A
        }
    } else if entry.has_field("alias") && entry.has_field("canonical") {
        RecordType::Cname
    } else if entry.has_field("network") {
        RecordType::Network
    } else {
        RecordType::Unknown
    }
}

/// A registered automation-owned resource
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryRecord {
    /// BackstageId
    pub backstage_id: String,
    /// Key of the entry in its document
    pub resource_key: String,
    /// BackstageEntity
    pub entity_name: Option<String>,
    /// Category of the source document
    pub category: RecordCategory,
    /// File name of the source document
    pub source_file: String,
    /// The full entry
    pub entry: ResourceEntry,
    /// CreatedAt
    pub created_at: Option<String>,
    /// Owner
    pub owner: Option<String>,
}

impl RegistryRecord {
    /// Flat projection used for listings
    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            backstage_id: self.backstage_id.clone(),
            entity_name: self.entity_name.clone(),
            resource_name: self.resource_key.clone(),
            source_file: self.source_file.clone(),
            owner: self.owner.clone(),
            created_at: self.created_at.clone(),
            record_type: record_type(&self.entry),
        }
    }
}

/// Listing projection of a [`RegistryRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    /// BackstageId
    pub backstage_id: String,
    /// BackstageEntity
    pub entity_name: Option<String>,
    /// Resource key
    pub resource_name: String,
    /// Source file name
    pub source_file: String,
    /// Owner
    pub owner: Option<String>,
    /// CreatedAt
    pub created_at: Option<String>,
    /// Inferred record type
    pub record_type: RecordType,
}

/// Where an entry lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLocation {
    /// Source file name
    pub source_file: String,
    /// Resource key
    pub resource_key: String,
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_file, self.resource_key)
    }
}

/// A BackstageId registered twice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateIdentifier {
    /// The identifier
    pub backstage_id: String,
    /// Occurrence that was replaced
    pub first: ResourceLocation,
    /// Occurrence now in the registry
    pub second: ResourceLocation,
}

/// Index of automation-owned resources by BackstageId
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    records: IndexMap<String, RegistryRecord>,
    duplicates: Vec<DuplicateIdentifier>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(category, document)` pairs, naming sources
    /// with the default category file names
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (RecordCategory, &'a ConfigDocument)>,
    {
        let mut registry = Self::new();
        for (category, document) in documents {
            registry.add_document(category, category.default_file_name(), document);
        }
        registry
    }

    /// Register every automation-owned entry of `document`
    pub fn add_document(
        &mut self,
        category: RecordCategory,
        source_file: impl Into<String>,
        document: &ConfigDocument,
    ) {
        let source_file = source_file.into();

        for (key, entry) in document.iter() {
            let tags = entry.tags();
            if !tags.is_created_by_automation() {
                continue;
            }
            let Some(backstage_id) = tags.backstage_id.clone() else {
                continue;
            };

            let record = RegistryRecord {
                backstage_id: backstage_id.clone(),
                resource_key: key.to_string(),
                entity_name: tags.backstage_entity.clone(),
                category,
                source_file: source_file.clone(),
                entry: entry.clone(),
                created_at: tags.created_at.clone(),
                owner: tags.owner.clone(),
            };

            if let Some(previous) = self.records.insert(backstage_id.clone(), record) {
                let duplicate = DuplicateIdentifier {
                    backstage_id,
                    first: ResourceLocation {
                        source_file: previous.source_file,
                        resource_key: previous.resource_key,
                    },
                    second: ResourceLocation {
                        source_file: source_file.clone(),
                        resource_key: key.to_string(),
                    },
                };
                tracing::warn!(
                    "BackstageId '{}' found at {} and {}; keeping the latter",
                    duplicate.backstage_id,
                    duplicate.first,
                    duplicate.second
                );
                self.duplicates.push(duplicate);
            }
        }
    }

    /// Fail on the first duplicate BackstageId, if any
    pub fn ensure_unique(&self) -> Result<()> {
        match self.duplicates.first() {
            Some(dup) => Err(Error::DuplicateIdentifier {
                backstage_id: dup.backstage_id.clone(),
                first: dup.first.to_string(),
                second: dup.second.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Duplicate identifiers seen while building
    pub fn duplicates(&self) -> &[DuplicateIdentifier] {
        &self.duplicates
    }

    /// Record lookup
    pub fn get(&self, backstage_id: &str) -> Option<&RegistryRecord> {
        self.records.get(backstage_id)
    }

    /// Whether `backstage_id` is registered
    pub fn contains(&self, backstage_id: &str) -> bool {
        self.records.contains_key(backstage_id)
    }

    /// Records in registration order
    pub fn records(&self) -> impl Iterator<Item = &RegistryRecord> {
        self.records.values()
    }

    /// Number of registered identifiers
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No registered identifiers
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// List resources sorted by `created_at` (missing first)
    ///
    /// With a non-empty `entity_filter`, only resources whose entity name
    /// *contains* the filter are returned.
    pub fn list(&self, entity_filter: Option<&str>) -> Vec<ResourceSummary> {
        let filter = entity_filter.filter(|f| !f.is_empty());

        let mut resources: Vec<ResourceSummary> = self
            .records
            .values()
            .filter(|record| match filter {
                Some(f) => record.entity_name.as_deref().unwrap_or("").contains(f),
                None => true,
            })
            .map(RegistryRecord::summary)
            .collect();

        // Stable: equal timestamps keep registration order
        resources.sort_by(|a, b| {
            let a = a.created_at.as_deref().unwrap_or("");
            let b = b.created_at.as_deref().unwrap_or("");
            a.cmp(b)
        });
        resources
    }

    /// Resources whose entity name *equals* `entity_name`, sorted like [`list`]
    ///
    /// [`list`]: ResourceRegistry::list
    pub fn find_by_entity(&self, entity_name: &str) -> Vec<ResourceSummary> {
        self.list(None)
            .into_iter()
            .filter(|r| r.entity_name.as_deref() == Some(entity_name))
            .collect()
    }
}
