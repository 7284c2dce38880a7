//! Query and removal of Backstage-managed resources in a config directory
//!
//! The [`ResourceManager`] owns a registry built from every category file of
//! one directory. Queries are answered from the registry; [`remove`] edits
//! the source file through the document store and rebuilds the registry.
//!
//! [`remove`]: ResourceManager::remove

use std::path::{Path, PathBuf};

use crate::cleanup::{self, CleanupPlan};
use crate::config::{CategoryFileNames, RecordCategory};
use crate::error::{Error, Result};
use crate::registry::{RegistryRecord, ResourceRegistry, ResourceSummary};
use crate::traits::{DocumentHeader, DocumentStore};

/// A resource removed by [`ResourceManager::remove`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedResource {
    /// BackstageId
    pub backstage_id: String,
    /// Key removed from the file
    pub resource_key: String,
    /// File the key was removed from
    pub path: PathBuf,
}

/// Registry-backed view of one config directory
pub struct ResourceManager<S: DocumentStore> {
    store: S,
    config_dir: PathBuf,
    file_names: CategoryFileNames,
    strict: bool,
    registry: ResourceRegistry,
}

impl<S: DocumentStore> ResourceManager<S> {
    /// Load every category file of `config_dir` and build the registry
    ///
    /// With `strict`, duplicate BackstageIds are an error instead of a
    /// warning.
    pub async fn load(
        store: S,
        config_dir: impl Into<PathBuf>,
        file_names: CategoryFileNames,
        strict: bool,
    ) -> Result<Self> {
        let mut manager = Self {
            store,
            config_dir: config_dir.into(),
            file_names,
            strict,
            registry: ResourceRegistry::new(),
        };
        manager.reload().await?;
        Ok(manager)
    }

    /// Rebuild the registry from disk
    pub async fn reload(&mut self) -> Result<()> {
        let mut registry = ResourceRegistry::new();

        for category in RecordCategory::ALL {
            let file_name = self.file_names.file_name(category);
            let path = self.config_dir.join(&file_name);
            if !self.store.exists(&path).await {
                continue;
            }
            let document = self.store.load(&path).await?;
            registry.add_document(category, file_name, &document);
        }

        if self.strict {
            registry.ensure_unique()?;
        }

        tracing::debug!(
            "Registry built from {}: {} Backstage resource(s)",
            self.config_dir.display(),
            registry.len()
        );
        self.registry = registry;
        Ok(())
    }

    /// The current registry
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Directory the manager reads
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// See [`ResourceRegistry::list`]
    pub fn list(&self, entity_filter: Option<&str>) -> Vec<ResourceSummary> {
        self.registry.list(entity_filter)
    }

    /// See [`ResourceRegistry::find_by_entity`]
    pub fn find_by_entity(&self, entity_name: &str) -> Vec<ResourceSummary> {
        self.registry.find_by_entity(entity_name)
    }

    /// Cleanup plan for `backstage_ids`
    pub fn cleanup_plan<T: AsRef<str>>(&self, backstage_ids: &[T]) -> CleanupPlan {
        cleanup::plan(&self.registry, backstage_ids)
    }

    /// Remove the resource registered under `backstage_id` from its file
    pub async fn remove(&mut self, backstage_id: &str) -> Result<RemovedResource> {
        let RegistryRecord {
            resource_key,
            category,
            source_file,
            ..
        } = self
            .registry
            .get(backstage_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Resource with ID '{}'", backstage_id)))?;

        let path = self.config_dir.join(&source_file);
        let mut document = self.store.load(&path).await?;

        if document.remove(&resource_key).is_none() {
            return Err(Error::not_found(format!(
                "Resource '{}' in {}",
                resource_key, source_file
            )));
        }

        self.store
            .save(&document, &path, &DocumentHeader::new(category))
            .await?;
        tracing::info!("Removed resource '{}' from {}", resource_key, source_file);

        self.reload().await?;

        Ok(RemovedResource {
            backstage_id: backstage_id.to_string(),
            resource_key,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ConfigDocument;
    use crate::store::MemoryDocumentStore;

    const A_RECORDS: &str = r#"
legacy: {fqdn: legacy.example.com, ip_addr: 10.0.0.5}
old_app: {fqdn: old.example.com, ip_addr: 10.0.0.6, ea_tags: {CreatedBy: backstage, BackstageId: old-app-test-20250901120000, BackstageEntity: old-app}}
"#;

    async fn seeded() -> (MemoryDocumentStore, ResourceManager<MemoryDocumentStore>) {
        let store = MemoryDocumentStore::new();
        store
            .insert(
                "/cfg/a-records.yaml",
                ConfigDocument::from_yaml_str(A_RECORDS).unwrap(),
            )
            .await;
        let manager = ResourceManager::load(
            store.clone(),
            "/cfg",
            CategoryFileNames::default(),
            false,
        )
        .await
        .unwrap();
        (store, manager)
    }

    #[tokio::test]
    async fn test_load_and_query() {
        let (_, manager) = seeded().await;
        assert_eq!(manager.list(None).len(), 1);
        assert_eq!(manager.find_by_entity("old-app").len(), 1);
        assert_eq!(
            manager.cleanup_plan(&["old-app-test-20250901120000"]).resources_to_remove[0]
                .terraform_resource,
            "infoblox_a_record.old_app"
        );
    }

    #[tokio::test]
    async fn test_remove_rewrites_source_file() {
        let (store, mut manager) = seeded().await;

        let removed = manager.remove("old-app-test-20250901120000").await.unwrap();
        assert_eq!(removed.resource_key, "old_app");
        assert_eq!(removed.path, PathBuf::from("/cfg/a-records.yaml"));

        let doc = store.load(Path::new("/cfg/a-records.yaml")).await.unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["legacy"]);
        assert!(manager.registry().is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_not_found() {
        let (_, mut manager) = seeded().await;
        let err = manager.remove("missing-dev-20250101000000").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_key_gone_from_file_is_not_found() {
        let (store, mut manager) = seeded().await;
        // File edited behind the registry's back
        store
            .insert("/cfg/a-records.yaml", ConfigDocument::new())
            .await;

        let err = manager.remove("old-app-test-20250901120000").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_duplicates() {
        let store = MemoryDocumentStore::new();
        let dup = "x: {alias: a, canonical: b, ea_tags: {CreatedBy: backstage, BackstageId: dup-dev-20250101000000}}\n";
        store
            .insert("/cfg/a-records.yaml", ConfigDocument::from_yaml_str(dup).unwrap())
            .await;
        store
            .insert("/cfg/cname-records.yaml", ConfigDocument::from_yaml_str(dup).unwrap())
            .await;

        let lenient =
            ResourceManager::load(store.clone(), "/cfg", CategoryFileNames::default(), false)
                .await
                .unwrap();
        assert_eq!(lenient.registry().duplicates().len(), 1);
        assert_eq!(
            lenient.registry().get("dup-dev-20250101000000").unwrap().source_file,
            "cname-records.yaml"
        );

        let strict =
            ResourceManager::load(store, "/cfg", CategoryFileNames::default(), true).await;
        assert!(matches!(strict, Err(Error::DuplicateIdentifier { .. })));
    }
}
