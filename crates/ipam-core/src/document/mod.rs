//! Order-preserving configuration documents
//!
//! A [`ConfigDocument`] is the in-memory form of one category file: a map
//! from resource key to [`ResourceEntry`], iterated in file order. Each entry
//! keeps its raw YAML value untouched so that unknown fields survive a
//! load/save cycle, and derives its [`Ownership`] once from the `ea_tags`
//! sub-mapping when it is constructed.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

/// Key of the extended-attribute tag sub-mapping
pub const EA_TAGS_KEY: &str = "ea_tags";

/// `CreatedBy` value marking an entry as produced by Backstage
pub const AUTOMATION_CREATOR: &str = "backstage";

/// Timestamp used when `CreatedAt` is absent in timestamp comparisons
pub const EPOCH_TIMESTAMP: &str = "1970-01-01";

/// Extended-attribute tags of a resource entry
///
/// Empty strings are normalised to `None`, except in `created_at_raw`;
/// non-string scalars are kept in their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EaTags {
    /// `CreatedBy`
    pub created_by: Option<String>,
    /// `BackstageId`
    pub backstage_id: Option<String>,
    /// `BackstageEntity`
    pub backstage_entity: Option<String>,
    /// `CreatedAt`
    pub created_at: Option<String>,
    /// `CreatedAt` as written, `Some("")` for an empty value
    pub created_at_raw: Option<String>,
    /// `Owner`
    pub owner: Option<String>,
}

impl EaTags {
    /// Read the tags of a raw entry value
    pub fn from_value(value: &Value) -> Self {
        let Some(tags) = value.get(EA_TAGS_KEY).and_then(Value::as_mapping) else {
            return Self::default();
        };

        let tag = |name: &str| {
            tags.get(name)
                .and_then(scalar_to_string)
                .filter(|s| !s.is_empty())
        };

        Self {
            created_by: tag("CreatedBy"),
            backstage_id: tag("BackstageId"),
            backstage_entity: tag("BackstageEntity"),
            created_at: tag("CreatedAt"),
            created_at_raw: tags.get("CreatedAt").and_then(scalar_to_string),
            owner: tag("Owner"),
        }
    }

    /// `CreatedAt` as written, or [`EPOCH_TIMESTAMP`] when absent
    ///
    /// A present but empty value stays `""` and sorts before the epoch.
    pub fn created_at_or_epoch(&self) -> &str {
        self.created_at_raw.as_deref().unwrap_or(EPOCH_TIMESTAMP)
    }

    /// `CreatedBy == "backstage"`
    pub fn is_created_by_automation(&self) -> bool {
        self.created_by.as_deref() == Some(AUTOMATION_CREATOR)
    }
}

/// Who owns a resource entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// No BackstageId: hand-maintained
    Manual,
    /// Carries a BackstageId
    Automation(AutomationOwner),
}

/// Ownership details of an automation-owned entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationOwner {
    /// Stable identifier
    pub backstage_id: String,
    /// Owning Backstage entity
    pub entity: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Informational owner
    pub owner: Option<String>,
}

impl Ownership {
    fn from_tags(tags: &EaTags) -> Self {
        match &tags.backstage_id {
            Some(id) => Ownership::Automation(AutomationOwner {
                backstage_id: id.clone(),
                entity: tags.backstage_entity.clone(),
                created_at: tags.created_at.clone(),
                owner: tags.owner.clone(),
            }),
            None => Ownership::Manual,
        }
    }
}

/// One resource declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    value: Value,
    tags: EaTags,
    ownership: Ownership,
}

impl ResourceEntry {
    /// Wrap a raw YAML value
    pub fn new(value: Value) -> Self {
        let tags = EaTags::from_value(&value);
        let ownership = Ownership::from_tags(&tags);
        Self {
            value,
            tags,
            ownership,
        }
    }

    /// Raw value as loaded
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Record fields, when the entry is a mapping
    pub fn fields(&self) -> Option<&Mapping> {
        self.value.as_mapping()
    }

    /// Field lookup
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields().and_then(|m| m.get(name))
    }

    /// Whether `name` is present, whatever its value
    pub fn has_field(&self, name: &str) -> bool {
        self.fields().is_some_and(|m| m.contains_key(name))
    }

    /// Parsed tags
    pub fn tags(&self) -> &EaTags {
        &self.tags
    }

    /// Derived ownership
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Non-empty BackstageId, if any
    pub fn backstage_id(&self) -> Option<&str> {
        match &self.ownership {
            Ownership::Automation(owner) => Some(&owner.backstage_id),
            Ownership::Manual => None,
        }
    }

    /// Shorthand for `backstage_id().is_some()`
    pub fn is_automation_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Automation(_))
    }

    /// Consume into the raw value
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl From<Value> for ResourceEntry {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Ordered mapping from resource key to entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    entries: IndexMap<String, ResourceEntry>,
}

impl ConfigDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed YAML mapping
    ///
    /// Scalar keys are converted to strings; keys that are not scalars
    /// cannot name a resource and are dropped with a warning.
    pub fn from_mapping(mapping: Mapping) -> Self {
        let mut entries = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            match scalar_to_string(&key) {
                Some(key) => {
                    entries.insert(key, ResourceEntry::new(value));
                }
                None => tracing::warn!(?key, "Ignoring entry with non-scalar key"),
            }
        }
        Self { entries }
    }

    /// Parse YAML text
    ///
    /// An empty or comment-only text yields an empty document. A top level
    /// that is not a mapping is rejected.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        match serde_yaml::from_str::<Value>(content)? {
            Value::Null => Ok(Self::new()),
            Value::Mapping(mapping) => Ok(Self::from_mapping(mapping)),
            other => Err(Error::invalid_input(format!(
                "Expected a mapping of resources at the top level, found {}",
                value_kind(&other)
            ))),
        }
    }

    /// Convert back into a YAML mapping, preserving key order
    pub fn to_mapping(&self) -> Mapping {
        self.entries
            .iter()
            .map(|(key, entry)| (Value::String(key.clone()), entry.value.clone()))
            .collect()
    }

    /// Serialize to block-style YAML
    ///
    /// serde_yaml does not fold long scalars, so lines are not bounded to a
    /// fixed width; every scalar stays on a single line.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_mapping())?)
    }

    /// Entry lookup
    pub fn get(&self, key: &str) -> Option<&ResourceEntry> {
        self.entries.get(key)
    }

    /// Key presence
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace; a replaced key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, entry: ResourceEntry) -> Option<ResourceEntry> {
        self.entries.insert(key.into(), entry)
    }

    /// Remove a key, keeping the order of the remaining keys
    pub fn remove(&mut self, key: &str) -> Option<ResourceEntry> {
        self.entries.shift_remove(key)
    }

    /// Keys in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ResourceEntry)> for ConfigDocument {
    fn from_iter<I: IntoIterator<Item = (K, ResourceEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Truthiness of a YAML value: null, false, zero and empty values are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
legacy_web_server:
  fqdn: legacy.example.com
  ip_addr: 10.0.0.5
  ea_tags:
    Owner: infra-team
my_app_api:
  fqdn: api.my-app.example.com
  ip_addr: 10.0.1.10
  ea_tags:
    CreatedBy: backstage
    BackstageId: my-app-dev-20250909120000
    BackstageEntity: my-app
    CreatedAt: "2025-09-09T12:00:00Z"
    Owner: platform-team
"#;

    #[test]
    fn test_parse_preserves_order_and_derives_ownership() {
        let doc = ConfigDocument::from_yaml_str(DOC).unwrap();
        assert_eq!(
            doc.keys().collect::<Vec<_>>(),
            vec!["legacy_web_server", "my_app_api"]
        );

        let manual = doc.get("legacy_web_server").unwrap();
        assert_eq!(manual.ownership(), &Ownership::Manual);
        assert_eq!(manual.tags().owner.as_deref(), Some("infra-team"));

        let automated = doc.get("my_app_api").unwrap();
        assert_eq!(automated.backstage_id(), Some("my-app-dev-20250909120000"));
        assert!(automated.tags().is_created_by_automation());
        match automated.ownership() {
            Ownership::Automation(owner) => {
                assert_eq!(owner.entity.as_deref(), Some("my-app"));
                assert_eq!(owner.created_at.as_deref(), Some("2025-09-09T12:00:00Z"));
            }
            Ownership::Manual => panic!("expected automation ownership"),
        }
    }

    #[test]
    fn test_empty_backstage_id_is_manual() {
        let doc = ConfigDocument::from_yaml_str(
            "r:\n  fqdn: a.example.com\n  ea_tags:\n    BackstageId: \"\"\n",
        )
        .unwrap();
        assert!(!doc.get("r").unwrap().is_automation_owned());
    }

    #[test]
    fn test_missing_created_at_is_epoch() {
        assert_eq!(EaTags::default().created_at_or_epoch(), EPOCH_TIMESTAMP);
    }

    #[test]
    fn test_empty_created_at_is_kept_for_ordering() {
        let doc = ConfigDocument::from_yaml_str(
            "r:\n  fqdn: a.example.com\n  ea_tags:\n    CreatedAt: \"\"\n",
        )
        .unwrap();
        let tags = doc.get("r").unwrap().tags();
        assert_eq!(tags.created_at, None);
        assert_eq!(tags.created_at_raw.as_deref(), Some(""));
        assert_eq!(tags.created_at_or_epoch(), "");
    }

    #[test]
    fn test_empty_and_comment_only_text() {
        assert!(ConfigDocument::from_yaml_str("").unwrap().is_empty());
        assert!(
            ConfigDocument::from_yaml_str("# No records configured\n")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_non_mapping_top_level_is_rejected() {
        let err = ConfigDocument::from_yaml_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = ConfigDocument::from_yaml_str("a: 1\nb: 2\nc: 3\n").unwrap();
        assert!(doc.remove("b").is_some());
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(doc.remove("b").is_none());
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut doc = ConfigDocument::from_yaml_str("a: 1\nb: 2\n").unwrap();
        doc.insert("a", ResourceEntry::new(Value::from(3)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(doc.get("a").unwrap().value(), &Value::from(3));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&Value::Bool(true)));
        assert!(!is_truthy(&Value::Bool(false)));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::from(0)));
        assert!(is_truthy(&Value::from(1)));
        assert!(!is_truthy(&Value::from("")));
        assert!(is_truthy(&Value::from("yes")));
    }
}
