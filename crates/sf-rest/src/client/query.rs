use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::Result;
use crate::query::QueryResult;

impl super::SalesforceRestClient {
    /// Execute a SOQL query and return the first page of results.
    #[instrument(skip(self))]
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        self.client.query(soql).await.map_err(Into::into)
    }

    /// Execute a SOQL query and fetch every page.
    ///
    /// Only the top-level record list is paginated; subquery collections
    /// nested inside records are returned as the platform sent them.
    #[instrument(skip(self))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        self.client.query_all(soql).await.map_err(Into::into)
    }
}
