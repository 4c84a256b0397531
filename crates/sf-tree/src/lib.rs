//! # busbar-sf-tree
//!
//! Export record hierarchies into the Salesforce composite tree format and
//! import them back.
//!
//! ## Features
//!
//! - **Tree Export** - Turn a nested SOQL result into `{records: [...]}` with
//!   symbolic `@<Type>Ref<N>` references in place of record ids
//! - **Plans** - Split an export into per-type files plus a manifest ordered
//!   so parents are inserted before the records that point at them
//! - **Tree Import** - Post tree files or a plan, substituting references
//!   with the ids returned by earlier files
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_rest::SalesforceRestClient;
//! use busbar_sf_tree::{ExportConfig, ImportConfig, TreeExporter, TreeImporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_tree::Error> {
//!     let client = SalesforceRestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!
//!     let mut exporter = TreeExporter::new(client.clone());
//!     let export = exporter
//!         .export(
//!             &ExportConfig::new("SELECT Name, (SELECT LastName FROM Contacts) FROM Account")
//!                 .with_plan(true)
//!                 .with_output_dir("data"),
//!         )
//!         .await?;
//!
//!     let manifest = export.files.last().expect("plan manifest");
//!     let result = TreeImporter::new(client)
//!         .import(&ImportConfig::plan(manifest))
//!         .await?;
//!     println!("inserted {} records", result.response_refs.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod export;
mod import;
mod metadata;
mod plan;
mod references;
mod registry;
mod types;

#[cfg(test)]
mod testing;

// Collaborator
pub use client::QueryClient;

// Error types
pub use error::{Error, ErrorKind, Result};

// Export
pub use export::{ExportConfig, ExportContext, TreeExporter, COMPOSITE_TREE_RECORD_LIMIT};

// Import
pub use import::{content_type_for, sobject_types, ImportConfig, ImportContext, ImportSource, TreeImporter};

// Building blocks
pub use metadata::{FieldKind, MetadataCache, ObjectSchema};
pub use plan::{
    build_plan, manifest_file_name, tree_file_name, type_file_name, write_plan, Plan, PlanPart,
};
pub use references::ReferenceRegistry;
pub use registry::{ObjectTypeRegistry, TypeEntry};

// Record and file shapes
pub use types::{
    BasicRecord, ChildRecords, DataPlanPart, ExportResult, FieldValue, ImportResult, PlanFile,
    PlanFileSpec, RecordAttributes, Reference, ReferenceState, ResponseRef, SObjectTree,
    TreeAttributes, TreeRecord,
};

pub use busbar_sf_rest::TreeContentType;
