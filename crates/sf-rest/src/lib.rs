//! # busbar-sf-rest
//!
//! The Salesforce REST API calls the tree export/import engine depends on.
//!
//! ## Features
//!
//! - **SOQL Query** - Execute queries with automatic pagination; nested
//!   subquery results are preserved as-is
//! - **Describe** - Object field metadata and child relationships
//! - **Composite Tree** - Insert record hierarchies from a JSON or XML body
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_rest::SalesforceRestClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_rest::Error> {
//!     let client = SalesforceRestClient::new(
//!         "https://myorg.my.salesforce.com",
//!         "access_token_here",
//!     )?;
//!
//!     let accounts = client
//!         .query_all::<serde_json::Value>("SELECT Id, Name, (SELECT Id FROM Contacts) FROM Account")
//!         .await?;
//!
//!     let describe = client.describe_sobject("Account").await?;
//!     println!("{} has {} fields", describe.name, describe.fields.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod composite;
mod describe;
mod error;
mod query;

// Main client
pub use client::SalesforceRestClient;

// Composite tree API
pub use composite::{
    CompositeTreeError, CompositeTreeResponse, CompositeTreeResult, TreeContentType,
};

// Describe types
pub use describe::{ChildRelationship, DescribeSObjectResult, FieldDescribe};

// Error types
pub use error::{Error, ErrorKind, Result};

// Query types
pub use query::QueryResult;

// Re-export sf-client types that users might need
pub use busbar_sf_client::{ClientConfig, ClientConfigBuilder, RetryConfig};
