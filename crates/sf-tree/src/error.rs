//! Error types for busbar-sf-tree.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid import source: {0}")]
    InvalidImportSource(String),

    #[error("Invalid plan {path}: {message}")]
    InvalidPlan { path: String, message: String },

    #[error("Invalid data import: {0}")]
    InvalidDataImport(String),

    #[error("Metadata not found for {0}")]
    MetadataNotFound(String),

    #[error("Field {field} on {sobject} is not a relationship")]
    RelationshipNotFound { sobject: String, field: String },

    #[error(
        "Reference ID {id} for type {sobject} not found in query results; \
         include the referenced records in the query"
    )]
    ReferenceNotFound { sobject: String, id: String },

    #[error("Overriding reference for {sobject} {id}: {existing} already saved, got {reference_id}")]
    OverridingReference {
        sobject: String,
        id: String,
        existing: String,
        reference_id: String,
    },

    #[error("No ref id found for @{0}; import the file that saves it first")]
    NoRefId(String),

    #[error("Tree import of {file} failed: {}", errors.join("; "))]
    TreeImport { file: String, errors: Vec<String> },

    #[error("Field {field} on {sobject} is not accessible; check field-level security")]
    FieldNotAccessible { field: String, sobject: String },

    #[error("{error_code}: {message}")]
    Api { error_code: String, message: String },

    #[error("Client error: {0}")]
    Client(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("XML error: {0}")]
    Xml(String),
}

impl From<busbar_sf_rest::Error> for Error {
    fn from(err: busbar_sf_rest::Error) -> Self {
        let kind = match &err.kind {
            busbar_sf_rest::ErrorKind::Salesforce {
                error_code,
                message,
            } => ErrorKind::Api {
                error_code: error_code.clone(),
                message: message.clone(),
            },
            _ => ErrorKind::Client(err.to_string()),
        };
        Error {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Json(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error {
            kind: ErrorKind::Xml(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error {
            kind: ErrorKind::Xml(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_salesforce_error_becomes_api() {
        let rest = busbar_sf_rest::Error::new(busbar_sf_rest::ErrorKind::Salesforce {
            error_code: "MALFORMED_QUERY".to_string(),
            message: "unexpected token".to_string(),
        });
        let err: Error = rest.into();
        assert!(
            matches!(err.kind, ErrorKind::Api { ref error_code, .. } if error_code == "MALFORMED_QUERY")
        );
        assert_eq!(err.to_string(), "MALFORMED_QUERY: unexpected token");
    }

    #[test]
    fn test_tree_import_display_lists_every_error() {
        let err = Error::new(ErrorKind::TreeImport {
            file: "Accounts.json".to_string(),
            errors: vec!["AccountRef1: A".to_string(), "AccountRef2: B".to_string()],
        });
        assert_eq!(
            err.to_string(),
            "Tree import of Accounts.json failed: AccountRef1: A; AccountRef2: B"
        );
    }
}
