use busbar_sf_client::security::soql;
use tracing::instrument;

use crate::describe::DescribeSObjectResult;
use crate::error::{Error, ErrorKind, Result};

impl super::SalesforceRestClient {
    /// Describe an SObject's fields and child relationships.
    #[instrument(skip(self))]
    pub async fn describe_sobject(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        if !soql::is_safe_sobject_name(sobject) {
            return Err(Error::new(ErrorKind::Salesforce {
                error_code: "INVALID_SOBJECT".to_string(),
                message: format!("Invalid SObject name: {sobject}"),
            }));
        }
        let path = format!("sobjects/{sobject}/describe");
        self.client.rest_get(&path).await.map_err(Into::into)
    }
}
