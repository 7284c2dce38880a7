// # ipam-core
//
// Core library for reconciling Backstage-generated IPAM/DNS configuration
// with the per-environment files consumed by Terraform.
//
// ## Architecture Overview
//
// - **DocumentStore**: Trait for loading and saving category documents
// - **ResourceRegistry**: Index of automation-owned resources by BackstageId
// - **detect_conflicts**: Ownership collisions between two documents
// - **resolve**: Strategy-driven merge of an incoming document
// - **MergeEngine**: Backup, merge and report for one environment
// - **ResourceManager**: Query and removal of registered resources
// - **cleanup::plan**: Terraform addresses for resources to destroy
//
// ## Design Principles
//
// 1. **Library-First**: The CLI only parses arguments and formats output
// 2. **Explicit Paths**: Every component receives its directories through
//    configuration, never the working directory
// 3. **Ownership at Load Time**: Each entry's owner is derived once, when the
//    document is read
// 4. **All-or-Nothing Writes**: Documents are replaced atomically

pub mod cleanup;
pub mod config;
pub mod conflict;
pub mod document;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod manager;
pub mod merge;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use cleanup::{CleanupPlan, CleanupPlanItem};
pub use config::{CategoryFileNames, Environment, RecordCategory, SyncConfig};
pub use conflict::{Conflict, ConflictKind, detect_conflicts};
pub use document::{ConfigDocument, Ownership, ResourceEntry};
pub use engine::{FileOutcome, MergeEngine, MergeReport};
pub use error::{Error, Result};
pub use identifier::BackstageId;
pub use manager::ResourceManager;
pub use merge::{MergeStrategy, resolve};
pub use registry::{RecordType, ResourceRegistry, ResourceSummary};
pub use store::{FileDocumentStore, MemoryDocumentStore};
pub use traits::{DocumentHeader, DocumentStore};
