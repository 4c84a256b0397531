//! The remote operations the tree engine depends on.

use std::future::Future;

use busbar_sf_rest::{
    CompositeTreeResponse, DescribeSObjectResult, QueryResult, SalesforceRestClient,
    TreeContentType,
};

use crate::error::Result;
use crate::types::BasicRecord;

/// Query, describe, and composite tree insert.
///
/// Implemented for [`SalesforceRestClient`]; tests substitute an in-memory
/// implementation.
pub trait QueryClient: Send + Sync {
    /// Run a SOQL query, fetching every page of the top-level records.
    fn query(&self, soql: &str) -> impl Future<Output = Result<QueryResult<BasicRecord>>> + Send;

    /// Describe an object type.
    fn describe(&self, sobject: &str) -> impl Future<Output = Result<DescribeSObjectResult>> + Send;

    /// Endpoint that inserts trees of `sobject`.
    fn tree_endpoint(&self, sobject: &str) -> Result<String>;

    /// POST a serialized tree to an endpoint from
    /// [`tree_endpoint`](Self::tree_endpoint).
    ///
    /// A response flagged `hasErrors` is returned, not raised.
    fn create_tree(
        &self,
        endpoint: &str,
        body: String,
        content_type: TreeContentType,
    ) -> impl Future<Output = Result<CompositeTreeResponse>> + Send;
}

impl QueryClient for SalesforceRestClient {
    async fn query(&self, soql: &str) -> Result<QueryResult<BasicRecord>> {
        Ok(self.query_all(soql).await?)
    }

    async fn describe(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        Ok(self.describe_sobject(sobject).await?)
    }

    fn tree_endpoint(&self, sobject: &str) -> Result<String> {
        Ok(self.composite_tree_url(sobject)?)
    }

    async fn create_tree(
        &self,
        endpoint: &str,
        body: String,
        content_type: TreeContentType,
    ) -> Result<CompositeTreeResponse> {
        Ok(self.post_tree(endpoint, body, content_type).await?)
    }
}
