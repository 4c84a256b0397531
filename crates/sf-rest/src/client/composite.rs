use busbar_sf_client::security::soql;
use tracing::{debug, instrument};

use crate::composite::{CompositeTreeResponse, TreeContentType};
use crate::error::{Error, ErrorKind, Result};

impl super::SalesforceRestClient {
    /// Full URL of the composite tree endpoint for `sobject`.
    pub fn composite_tree_url(&self, sobject: &str) -> Result<String> {
        if !soql::is_safe_sobject_name(sobject) {
            return Err(Error::new(ErrorKind::Salesforce {
                error_code: "INVALID_SOBJECT".to_string(),
                message: format!("Invalid SObject name: {sobject}"),
            }));
        }
        Ok(self.client.rest_url(&format!("composite/tree/{sobject}")))
    }

    /// Insert a serialized record tree via `POST /composite/tree/{sobject}`.
    ///
    /// The body is sent as-is with the given content type. A response
    /// flagged `hasErrors` is returned as `Ok` so callers can inspect the
    /// per-record errors; the platform answers those with HTTP 400.
    pub async fn composite_tree(
        &self,
        sobject: &str,
        body: String,
        content_type: TreeContentType,
    ) -> Result<CompositeTreeResponse> {
        let url = self.composite_tree_url(sobject)?;
        self.post_tree(&url, body, content_type).await
    }

    /// POST a tree body to an endpoint from [`composite_tree_url`](Self::composite_tree_url).
    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn post_tree(
        &self,
        url: &str,
        body: String,
        content_type: TreeContentType,
    ) -> Result<CompositeTreeResponse> {
        let request = self
            .client
            .post(url)
            .raw(body, content_type.mime_type())
            .accept_json();

        let response = self.client.execute_raw(request).await?;
        let status = response.status();
        let text = response.text().await?;

        if (200..300).contains(&status) {
            return Ok(serde_json::from_str(&text)?);
        }

        if let Ok(tree) = serde_json::from_str::<CompositeTreeResponse>(&text) {
            if tree.has_errors {
                debug!(status, results = tree.results.len(), "Composite tree reported errors");
                return Ok(tree);
            }
        }

        Err(busbar_sf_client::parse_error_response(status, &text).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, SalesforceRestClient, TreeContentType};
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_composite_tree_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/composite/tree/Account"))
            .and(header("Content-Type", "application/json"))
            .and(body_string_contains("AccountRef1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "hasErrors": false,
                "results": [{"referenceId": "AccountRef1", "id": "001xx000003DGb2AAG"}]
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let body = r#"{"records":[{"attributes":{"type":"Account","referenceId":"AccountRef1"},"Name":"Acme"}]}"#;
        let response = client
            .composite_tree("Account", body.to_string(), TreeContentType::Json)
            .await
            .expect("composite tree should succeed");

        assert!(!response.has_errors);
        assert_eq!(response.results[0].id.as_deref(), Some("001xx000003DGb2AAG"));
    }

    #[tokio::test]
    async fn test_composite_tree_xml_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/composite/tree/Account"))
            .and(header("Content-Type", "application/xml"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "hasErrors": false,
                "results": [{"referenceId": "AccountRef1", "id": "001xx000003DGb2AAG"}]
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let body = r#"<SObjectTreeRequest><records type="Account" referenceId="AccountRef1"><Name>Acme</Name></records></SObjectTreeRequest>"#;
        let response = client
            .composite_tree("Account", body.to_string(), TreeContentType::Xml)
            .await
            .expect("xml tree should succeed");

        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn test_composite_tree_has_errors_is_returned() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/composite/tree/Account"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "hasErrors": true,
                "results": [{
                    "referenceId": "AccountRef1",
                    "errors": [{
                        "statusCode": "INVALID_FIELD",
                        "message": "No such column 'Foo__c' on sobject of type Account",
                        "fields": []
                    }]
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let response = client
            .composite_tree("Account", "{}".to_string(), TreeContentType::Json)
            .await
            .expect("hasErrors responses come back as Ok");

        assert!(response.has_errors);
        assert_eq!(response.results[0].errors[0].status_code, "INVALID_FIELD");
    }

    #[tokio::test]
    async fn test_composite_tree_plain_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/composite/tree/Account"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!([{
                "errorCode": "JSON_PARSER_ERROR",
                "message": "Unexpected character"
            }])))
            .mount(&mock_server)
            .await;

        let client = SalesforceRestClient::new(mock_server.uri(), "test-token").unwrap();
        let err = client
            .composite_tree("Account", "{".to_string(), TreeContentType::Json)
            .await
            .unwrap_err();

        assert!(
            matches!(err.kind, ErrorKind::Salesforce { ref error_code, .. } if error_code == "JSON_PARSER_ERROR")
        );
    }
}
