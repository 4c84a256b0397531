//! Composite tree API types.

use serde::{Deserialize, Serialize};

/// Body format of a composite tree request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeContentType {
    Json,
    Xml,
}

impl TreeContentType {
    /// MIME type sent as `Content-Type`.
    pub fn mime_type(&self) -> &'static str {
        match self {
            TreeContentType::Json => "application/json",
            TreeContentType::Xml => "application/xml",
        }
    }
}

impl std::fmt::Display for TreeContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeContentType::Json => f.write_str("json"),
            TreeContentType::Xml => f.write_str("xml"),
        }
    }
}

/// Response from a composite tree request.
///
/// On success every result carries the new record `id`; when `has_errors`
/// is set, the results list the failing reference ids with their errors and
/// nothing was committed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompositeTreeResponse {
    #[serde(rename = "hasErrors")]
    pub has_errors: bool,
    pub results: Vec<CompositeTreeResult>,
}

/// Result of a single record creation in a composite tree request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompositeTreeResult {
    #[serde(rename = "referenceId")]
    pub reference_id: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub errors: Vec<CompositeTreeError>,
}

/// Error details for a failed record creation in a composite tree request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompositeTreeError {
    #[serde(rename = "statusCode")]
    pub status_code: String,
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_tree_response_success() {
        let json = r#"{
            "hasErrors": false,
            "results": [
                {"referenceId": "AccountRef1", "id": "001xx000003DGb2AAG"},
                {"referenceId": "ContactRef1", "id": "003xx000004TmiQAAS"}
            ]
        }"#;

        let response: CompositeTreeResponse = serde_json::from_str(json).unwrap();
        assert!(!response.has_errors);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].id.as_deref(), Some("001xx000003DGb2AAG"));
        assert!(response.results[1].errors.is_empty());
    }

    #[test]
    fn test_composite_tree_response_with_errors() {
        let json = r#"{
            "hasErrors": true,
            "results": [{
                "referenceId": "AccountRef2",
                "errors": [{
                    "statusCode": "REQUIRED_FIELD_MISSING",
                    "message": "Required fields are missing: [Name]",
                    "fields": ["Name"]
                }]
            }]
        }"#;

        let response: CompositeTreeResponse = serde_json::from_str(json).unwrap();
        assert!(response.has_errors);
        assert!(response.results[0].id.is_none());
        assert_eq!(response.results[0].errors[0].status_code, "REQUIRED_FIELD_MISSING");
        assert_eq!(response.results[0].errors[0].fields, vec!["Name".to_string()]);
    }

    #[test]
    fn test_content_type_mime_and_serde() {
        assert_eq!(TreeContentType::Json.mime_type(), "application/json");
        assert_eq!(TreeContentType::Xml.mime_type(), "application/xml");
        assert_eq!(
            serde_json::from_str::<TreeContentType>(r#""xml""#).unwrap(),
            TreeContentType::Xml
        );
        assert_eq!(TreeContentType::Json.to_string(), "json");
    }
}
