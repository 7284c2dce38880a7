//! Fixtures and test doubles shared by the contract tests

#![allow(dead_code)]

use async_trait::async_trait;
use ipam_core::document::ConfigDocument;
use ipam_core::error::Result;
use ipam_core::store::MemoryDocumentStore;
use ipam_core::traits::{DocumentHeader, DocumentStore};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Existing A records of an environment: one manual, one automation-owned
pub const EXISTING_A_RECORDS: &str = r#"
legacy_server:
  fqdn: legacy.example.com
  ip_addr: 10.10.0.5
  view: default
  ea_tags:
    Owner: network-team
old_app:
  fqdn: old-app.example.com
  ip_addr: 10.10.0.6
  view: default
  ea_tags:
    CreatedBy: backstage
    BackstageId: old-app-test-20250901120000
    BackstageEntity: old-app
    CreatedAt: "2025-09-01T12:00:00Z"
    Owner: platform-team
"#;

/// Fresh authoring-tool output without any collision
pub const NEW_BACKSTAGE_A_RECORDS: &str = r#"
my_app_api:
  fqdn: api.my-app.example.com
  ip_addr: 10.10.1.10
  view: default
  ea_tags:
    CreatedBy: backstage
    BackstageId: my-app-dev-20250909120000
    BackstageEntity: my-app
    CreatedAt: "2025-09-09T12:00:00Z"
    Owner: app-team
"#;

/// Authoring-tool output colliding with both existing entries
pub const CONFLICTING_A_RECORDS: &str = r#"
legacy_server:
  fqdn: legacy.example.com
  ip_addr: 10.10.9.9
  view: default
  ea_tags:
    CreatedBy: backstage
    BackstageId: legacy-takeover-dev-20250909120000
    BackstageEntity: legacy-takeover
old_app:
  fqdn: old-app.example.com
  ip_addr: 10.10.9.10
  view: default
  ea_tags:
    CreatedBy: backstage
    BackstageId: other-app-dev-20250909120000
    BackstageEntity: other-app
"#;

/// CNAME pointing at the new API
pub const NEW_BACKSTAGE_CNAME_RECORDS: &str = r#"
my_app_www:
  alias: www.my-app.example.com
  canonical: api.my-app.example.com
  view: default
  ea_tags:
    CreatedBy: backstage
    BackstageId: my-app-www-dev-20250909120001
    BackstageEntity: my-app
    CreatedAt: "2025-09-09T12:00:01Z"
"#;

/// Parse a fixture
pub fn doc(yaml: &str) -> ConfigDocument {
    ConfigDocument::from_yaml_str(yaml).expect("fixture must parse")
}

/// A MemoryDocumentStore that counts saves
#[derive(Clone, Default)]
pub struct CountingDocumentStore {
    inner: MemoryDocumentStore,
    save_call_count: Arc<AtomicUsize>,
}

impl CountingDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without counting a save
    pub async fn seed(&self, path: &str, yaml: &str) {
        self.inner.insert(path, doc(yaml)).await;
    }

    /// Number of save() calls so far
    pub fn save_call_count(&self) -> usize {
        self.save_call_count.load(Ordering::SeqCst)
    }

    /// The wrapped store
    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }
}

#[async_trait]
impl DocumentStore for CountingDocumentStore {
    async fn load(&self, path: &Path) -> Result<ConfigDocument> {
        self.inner.load(path).await
    }

    async fn save(
        &self,
        document: &ConfigDocument,
        path: &Path,
        header: &DocumentHeader,
    ) -> Result<()> {
        self.save_call_count.fetch_add(1, Ordering::SeqCst);
        self.inner.save(document, path, header).await
    }

    async fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path).await
    }
}

/// Write `content` to `dir/name`, creating `dir`
pub async fn write_file(dir: &Path, name: &str, content: &str) {
    tokio::fs::create_dir_all(dir).await.unwrap();
    tokio::fs::write(dir.join(name), content).await.unwrap();
}
