//! Transport errors.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// A failed request, with the underlying cause when there is one.
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

    /// Whether sending the same request again may succeed.
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            ErrorKind::RateLimited { .. } | ErrorKind::Timeout | ErrorKind::Connection(_) => true,
            ErrorKind::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::RateLimited { .. })
    }

    /// Server-requested wait before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.kind {
            ErrorKind::RateLimited { retry_after } => retry_after,
            _ => None,
        }
    }

    /// Platform error code such as `INVALID_FIELD` or `MALFORMED_QUERY`.
    pub fn api_error_code(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::SalesforceApi { error_code, .. } => Some(error_code),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited{}", retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 401; usually an expired access token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP 403.
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// HTTP 404.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Structured error body returned by the platform.
    #[error("{error_code}: {message}")]
    SalesforceApi {
        error_code: String,
        message: String,
        fields: Vec<String>,
    },

    #[error("Gave up after {attempts} retries")]
    RetriesExhausted { attempts: u32 },

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = match err.status() {
            _ if err.is_timeout() => ErrorKind::Timeout,
            _ if err.is_connect() => ErrorKind::Connection(err.to_string()),
            Some(status) => ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => ErrorKind::Other(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("invalid URL: {err}")), err)
    }
}
