//! Contract Test: Registry Queries and Cleanup Planning
//!
//! Only entries tagged `CreatedBy: backstage` with a BackstageId are
//! registered. Listing filters by entity substring, lookup by entity is
//! exact, and cleanup plans skip identifiers the registry does not know.

mod common;

use common::*;
use ipam_core::config::{CategoryFileNames, RecordCategory};
use ipam_core::manager::ResourceManager;
use ipam_core::registry::{RecordType, ResourceRegistry};

async fn manager() -> ResourceManager<CountingDocumentStore> {
    let store = CountingDocumentStore::new();
    store.seed("/cfg/a-records.yaml", EXISTING_A_RECORDS).await;
    store
        .seed("/cfg/cname-records.yaml", NEW_BACKSTAGE_CNAME_RECORDS)
        .await;
    ResourceManager::load(store, "/cfg", CategoryFileNames::default(), false)
        .await
        .unwrap()
}

#[tokio::test]
async fn manual_entries_are_not_registered() {
    let manager = manager().await;

    let ids: Vec<String> = manager
        .list(None)
        .into_iter()
        .map(|r| r.backstage_id)
        .collect();
    assert_eq!(
        ids,
        vec!["old-app-test-20250901120000", "my-app-www-dev-20250909120001"]
    );
    assert!(
        !manager
            .registry()
            .records()
            .any(|r| r.resource_key == "legacy_server")
    );
}

#[tokio::test]
async fn old_app_is_found_by_list_and_exact_entity() {
    let manager = manager().await;

    let listed = manager.list(Some("old-app"));
    assert_eq!(listed.len(), 1);
    let old_app = &listed[0];
    assert_eq!(old_app.resource_name, "old_app");
    assert_eq!(old_app.source_file, "a-records.yaml");
    assert_eq!(old_app.owner.as_deref(), Some("platform-team"));
    assert_eq!(old_app.record_type, RecordType::A);

    assert_eq!(manager.find_by_entity("old-app").len(), 1);
    assert!(manager.find_by_entity("old-ap").is_empty());
    assert_eq!(manager.list(Some("old-ap")).len(), 1);
}

#[tokio::test]
async fn cname_entries_are_typed_by_their_fields() {
    let manager = manager().await;
    let www = manager.find_by_entity("my-app");
    assert_eq!(www.len(), 1);
    assert_eq!(www[0].record_type, RecordType::Cname);
}

#[tokio::test]
async fn cleanup_plan_targets_a_record_address() {
    let manager = manager().await;

    let plan = manager.cleanup_plan(&["old-app-test-20250901120000", "ghost-dev-20250101000000"]);
    assert_eq!(plan.len(), 1);
    assert_eq!(
        plan.resources_to_remove[0].terraform_resource,
        "infoblox_a_record.old_app"
    );
    assert_eq!(
        plan.terraform_commands,
        vec!["terraform destroy -target=infoblox_a_record.old_app"]
    );
}

#[test]
fn listing_is_ordered_by_created_at() {
    let later = doc(NEW_BACKSTAGE_A_RECORDS);
    let earlier = doc(EXISTING_A_RECORDS);
    let registry = ResourceRegistry::build([
        (RecordCategory::HostRecords, &later),
        (RecordCategory::ARecords, &earlier),
    ]);

    let ids: Vec<String> = registry
        .list(None)
        .into_iter()
        .map(|r| r.backstage_id)
        .collect();
    assert_eq!(
        ids,
        vec!["old-app-test-20250901120000", "my-app-dev-20250909120000"]
    );
}
