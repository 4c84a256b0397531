//! # busbar-sf-client
//!
//! HTTP transport shared by the busbar-sf-data crates.
//!
//! This crate owns everything below the API surfaces:
//! - Automatic retry with exponential backoff and jitter
//! - Rate limit detection (HTTP 429 + `Retry-After`)
//! - Salesforce error body parsing and message sanitizing
//! - Typed JSON helpers and REST URL building
//! - SOQL / identifier safety checks
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │        busbar-sf-rest  (query, describe, composite tree)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - Instance URL + access token + API version                │
//! │  - Typed JSON GETs, paginated SOQL queries                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Raw HTTP with retry, compression, rate limiting          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_client::SalesforceClient;
//!
//! let client = SalesforceClient::new("https://myorg.my.salesforce.com", token)?;
//! let page: QueryResult<serde_json::Value> =
//!     client.query("SELECT Id, Name FROM Account").await?;
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{parse_error_response, ApiUsage, Response, ResponseExt};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};
pub use salesforce_client::{QueryResult, SalesforceClient};

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-sf-data/", env!("CARGO_PKG_VERSION"));
