//! Cleanup planning
//!
//! Turns a list of BackstageIds into the Terraform resource addresses that
//! have to be destroyed to remove them. Nothing is executed; the plan is
//! meant to be reviewed and handed to the apply engine.

use crate::config::RecordCategory;
use crate::registry::ResourceRegistry;
use serde::Serialize;

/// Terraform resource type for a category slug, `unknown` if unrecognised
pub fn engine_resource_type(category_slug: &str) -> &'static str {
    match RecordCategory::from_slug(category_slug) {
        Some(RecordCategory::ARecords) => "infoblox_a_record",
        Some(RecordCategory::CnameRecords) => "infoblox_cname_record",
        Some(RecordCategory::HostRecords) => "infoblox_host_record",
        Some(RecordCategory::Networks) => "infoblox_network",
        Some(RecordCategory::DnsZones) => "infoblox_zone_auth",
        None => "unknown",
    }
}

/// `<resource_type>.<resource_key>`
pub fn apply_engine_address(category_slug: &str, resource_key: &str) -> String {
    format!("{}.{}", engine_resource_type(category_slug), resource_key)
}

/// One resource to remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupPlanItem {
    /// BackstageId
    pub backstage_id: String,
    /// Resource key
    pub resource_name: String,
    /// Source file name
    pub source_file: String,
    /// Category of the source file
    #[serde(skip)]
    pub category: RecordCategory,
    /// Apply-engine address
    pub terraform_resource: String,
}

/// Removal plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupPlan {
    /// Resources found in the registry, in request order
    pub resources_to_remove: Vec<CleanupPlanItem>,
    /// Targeted destroy commands, one per resource
    pub terraform_commands: Vec<String>,
}

impl CleanupPlan {
    /// Number of planned removals
    pub fn len(&self) -> usize {
        self.resources_to_remove.len()
    }

    /// Nothing to remove
    pub fn is_empty(&self) -> bool {
        self.resources_to_remove.is_empty()
    }
}

/// Build a plan for `backstage_ids`; identifiers not in `registry` are skipped
pub fn plan<S: AsRef<str>>(registry: &ResourceRegistry, backstage_ids: &[S]) -> CleanupPlan {
    let mut plan = CleanupPlan::default();

    for id in backstage_ids {
        let id = id.as_ref();
        let Some(record) = registry.get(id) else {
            tracing::debug!("BackstageId not found, skipping: {}", id);
            continue;
        };

        let address = apply_engine_address(record.category.slug(), &record.resource_key);
        plan.terraform_commands
            .push(format!("terraform destroy -target={}", address));
        plan.resources_to_remove.push(CleanupPlanItem {
            backstage_id: id.to_string(),
            resource_name: record.resource_key.clone(),
            source_file: record.source_file.clone(),
            category: record.category,
            terraform_resource: address,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ConfigDocument;

    fn registry() -> ResourceRegistry {
        let a = ConfigDocument::from_yaml_str(
            "my_app_api: {fqdn: api.example.com, ip_addr: 10.0.0.1, ea_tags: {CreatedBy: backstage, BackstageId: my-app-dev-20250909120000}}\n",
        )
        .unwrap();
        let z = ConfigDocument::from_yaml_str(
            "my_zone: {fqdn: my.example.com, ea_tags: {CreatedBy: backstage, BackstageId: zone-dev-20250909120000}}\n",
        )
        .unwrap();
        ResourceRegistry::build([
            (RecordCategory::ARecords, &a),
            (RecordCategory::DnsZones, &z),
        ])
    }

    #[test]
    fn test_engine_resource_types() {
        assert_eq!(engine_resource_type("a-records"), "infoblox_a_record");
        assert_eq!(engine_resource_type("cname-records"), "infoblox_cname_record");
        assert_eq!(engine_resource_type("host-records"), "infoblox_host_record");
        assert_eq!(engine_resource_type("networks"), "infoblox_network");
        assert_eq!(engine_resource_type("dns-zones"), "infoblox_zone_auth");
        assert_eq!(engine_resource_type("mx-records"), "unknown");
        assert_eq!(apply_engine_address("mx-records", "k"), "unknown.k");
    }

    #[test]
    fn test_plan_a_record() {
        let plan = plan(&registry(), &["my-app-dev-20250909120000"]);
        assert_eq!(plan.len(), 1);
        let item = &plan.resources_to_remove[0];
        assert_eq!(item.terraform_resource, "infoblox_a_record.my_app_api");
        assert_eq!(item.source_file, "a-records.yaml");
        assert_eq!(
            plan.terraform_commands,
            vec!["terraform destroy -target=infoblox_a_record.my_app_api"]
        );
    }

    #[test]
    fn test_plan_skips_unknown_ids() {
        let plan = plan(
            &registry(),
            &["missing-dev-20250101000000", "zone-dev-20250909120000"],
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan.resources_to_remove[0].terraform_resource,
            "infoblox_zone_auth.my_zone"
        );

        let empty = super::plan(&registry(), &["missing-dev-20250101000000"]);
        assert!(empty.is_empty());
        assert!(empty.terraform_commands.is_empty());
    }

    #[test]
    fn test_plan_serializes_original_shape() {
        let plan = plan(&registry(), &["my-app-dev-20250909120000"]);
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json["terraform_commands"].is_array());
        let item = &json["resources_to_remove"][0];
        assert_eq!(item["backstage_id"], "my-app-dev-20250909120000");
        assert_eq!(item["resource_name"], "my_app_api");
        assert!(item.get("category").is_none());
    }
}
