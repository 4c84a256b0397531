//! High-level Salesforce client with typed HTTP methods.
//!
//! `SalesforceClient` combines an instance URL and access token with the
//! HTTP client. The access token is redacted in Debug output and skipped in
//! tracing spans.

use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::DEFAULT_API_VERSION;

/// High-level Salesforce API client.
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    /// Create a new Salesforce client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new Salesforce client with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let instance_url = instance_url.into();
        url::Url::parse(&instance_url)?;
        let http = SfHttpClient::new(config)?;
        Ok(Self {
            http,
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Transport settings this client was built with.
    pub fn http_config(&self) -> &ClientConfig {
        self.http.config()
    }

    /// Build the full URL for a path.
    ///
    /// Absolute URLs pass through; paths are appended to the instance URL.
    /// `nextRecordsUrl` values come back as absolute paths.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// Build the REST API URL for a path.
    ///
    /// Example: `rest_url("composite/tree/Account")` ->
    /// `{instance}/services/data/v62.0/composite/tree/Account`
    pub fn rest_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Create a GET request builder with authentication.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    /// Create a POST request builder with authentication.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    /// Execute a request, converting error responses into errors.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.http.execute(request).await
    }

    /// Execute a request and return the response whatever its status.
    pub async fn execute_raw(&self, request: RequestBuilder) -> Result<Response> {
        self.http.execute_raw(request).await
    }

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = self.get(&self.url(url));
        self.http.execute(request).await?.json().await
    }

    /// GET request to REST API with JSON response.
    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json(&self.rest_url(path)).await
    }

    /// Execute a SOQL query via REST API (first page only).
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let url = format!(
            "{}/services/data/v{}/query?q={}",
            self.instance_url,
            self.api_version,
            urlencoding::encode(soql)
        );
        self.get_json(&url).await
    }

    /// Execute a SOQL query and follow `nextRecordsUrl` until every page is
    /// fetched. The returned result always has `done == true`.
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let mut result: QueryResult<T> = self.query(soql).await?;
        let mut records = std::mem::take(&mut result.records);

        while let Some(next_url) = result.next_records_url.take() {
            result = self.get_json(&next_url).await?;
            records.append(&mut result.records);
        }

        Ok(QueryResult {
            total_size: result.total_size,
            done: true,
            next_records_url: None,
            records,
        })
    }
}

/// Result of a SOQL query.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct QueryResult<T> {
    /// Total number of records matching the query.
    #[serde(rename = "totalSize")]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    /// URL to fetch the next batch of results.
    #[serde(rename = "nextRecordsUrl", default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,

    pub records: Vec<T>,
}
