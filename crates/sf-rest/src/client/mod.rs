//! REST client for the calls tree export and import make.

use busbar_sf_client::{ClientConfig, SalesforceClient};

use crate::error::Result;

mod composite;
mod describe;
mod query;

/// Authenticated REST client bound to one org and API version.
///
/// ```rust,ignore
/// use busbar_sf_rest::{SalesforceRestClient, TreeContentType};
///
/// let client = SalesforceRestClient::new("https://myorg.my.salesforce.com", token)?;
/// let accounts = client.query_all::<serde_json::Value>("SELECT Name FROM Account").await?;
/// let inserted = client.composite_tree("Account", body, TreeContentType::Json).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SalesforceRestClient {
    client: SalesforceClient,
}

impl SalesforceRestClient {
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(instance_url, access_token)?;
        Ok(Self { client })
    }

    /// Same as [`new`](Self::new) with explicit transport settings.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(instance_url, access_token, config)?;
        Ok(Self { client })
    }

    /// Wrap an already configured transport client.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.with_api_version(version);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_override() {
        let client = SalesforceRestClient::new("https://test.salesforce.com/", "token123")
            .unwrap()
            .with_api_version("61.0");

        assert_eq!(client.instance_url(), "https://test.salesforce.com");
        assert_eq!(client.api_version(), "61.0");
        assert_eq!(
            client.inner().rest_url("composite/tree/Account"),
            "https://test.salesforce.com/services/data/v61.0/composite/tree/Account"
        );
    }

    #[test]
    fn test_with_config_and_from_client() {
        let config = ClientConfig::builder().without_retry().build();
        let client =
            SalesforceRestClient::with_config("https://test.salesforce.com", "token", config)
                .unwrap();
        assert!(client.inner().http_config().retry.is_none());

        let wrapped = SalesforceRestClient::from_client(client.inner().clone());
        assert_eq!(wrapped.api_version(), busbar_sf_client::DEFAULT_API_VERSION);
    }
}
