//! # busbar-sf-data
//!
//! Move Salesforce record hierarchies between orgs with the composite tree
//! API.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Crates
//!
//! - **busbar-sf-client** - HTTP transport with retry, compression, rate limiting
//! - **busbar-sf-rest** - REST API: paginated query, describe, composite tree
//! - **busbar-sf-tree** - Tree export, plans, and tree import
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_sf_data::{ExportConfig, SalesforceRestClient, TreeExporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SalesforceRestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!
//!     let mut exporter = TreeExporter::new(client);
//!     let result = exporter
//!         .export(&ExportConfig::new(
//!             "SELECT Name, (SELECT LastName FROM Contacts) FROM Account",
//!         ))
//!         .await?;
//!
//!     for path in &result.files {
//!         println!("wrote {}", path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
pub use busbar_sf_client as client;
pub use busbar_sf_rest as rest;
pub use busbar_sf_tree as tree;

// Re-export commonly used types at the top level
pub use busbar_sf_client::{ClientConfig, SalesforceClient};
pub use busbar_sf_rest::{SalesforceRestClient, TreeContentType};
pub use busbar_sf_tree::{
    ExportConfig, ExportResult, ImportConfig, ImportResult, QueryClient, TreeExporter,
    TreeImporter,
};
