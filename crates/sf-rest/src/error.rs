//! Error types for busbar-sf-rest.

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
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Transport failure (timeouts, connection, unparseable bodies, ...).
    #[error("Client error: {0}")]
    Client(String),
    /// Structured error reported by Salesforce.
    #[error("{error_code}: {message}")]
    Salesforce { error_code: String, message: String },
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        let kind = match &err.kind {
            busbar_sf_client::ErrorKind::SalesforceApi {
                error_code,
                message,
                ..
            } => ErrorKind::Salesforce {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salesforce_error_code_is_preserved() {
        let client_err = busbar_sf_client::Error::new(busbar_sf_client::ErrorKind::SalesforceApi {
            error_code: "INVALID_FIELD".to_string(),
            message: "No such column 'Foo__c' on sobject of type Account".to_string(),
            fields: vec![],
        });
        let err: Error = client_err.into();
        match err.kind {
            ErrorKind::Salesforce { error_code, .. } => assert_eq!(error_code, "INVALID_FIELD"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_transport_error_maps_to_client() {
        let err: Error = busbar_sf_client::Error::new(busbar_sf_client::ErrorKind::Timeout).into();
        assert!(matches!(err.kind, ErrorKind::Client(_)));
        assert!(err.source.is_some());
    }
}
