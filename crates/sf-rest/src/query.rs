//! SOQL query types.
//!
//! `QueryResult` is re-exported from busbar_sf_client so pages returned by
//! either layer are the same type.

pub use busbar_sf_client::QueryResult;
