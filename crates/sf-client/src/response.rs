//! HTTP response handling with Salesforce-specific extensions.

use regex_lite::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// Wrapper around an HTTP response.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Get the Retry-After header as a Duration (seconds form only).
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.inner.json().await.map_err(Into::into)
    }

    /// Get API usage limits from the `Sforce-Limit-Info` header
    /// (format: `api-usage=25/15000`).
    pub fn api_usage(&self) -> Option<ApiUsage> {
        let info = self.header("sforce-limit-info")?;

        info.split(',')
            .map(str::trim)
            .find_map(|part| part.strip_prefix("api-usage="))
            .and_then(|usage| {
                let (used, limit) = usage.split_once('/')?;
                Some(ApiUsage {
                    used: used.parse().ok()?,
                    limit: limit.parse().ok()?,
                })
            })
    }
}

/// API usage information from response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiUsage {
    /// Number of API calls used.
    pub used: u64,
    /// Total API call limit.
    pub limit: u64,
}

impl ApiUsage {
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// Extension trait for processing Salesforce API responses.
pub trait ResponseExt {
    /// Check for Salesforce API errors and convert to the appropriate error type.
    fn check_salesforce_error(self) -> impl std::future::Future<Output = Result<Response>> + Send;
}

impl ResponseExt for Response {
    async fn check_salesforce_error(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }

        let status = self.status();
        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, &body))
    }
}

/// Convert a non-success response body into an [`Error`].
///
/// Salesforce reports failures either as an array of
/// `{errorCode, message, fields}` objects or as a single such object.
/// Anything else is mapped from the status code with a sanitized body.
pub fn parse_error_response(status: u16, body: &str) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after: None });
    }

    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body) {
        if let Some(err) = errors.into_iter().next() {
            return err.into_error();
        }
    }

    if let Ok(err) = serde_json::from_str::<SalesforceErrorResponse>(body) {
        return err.into_error();
    }

    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Authentication(sanitized),
        403 => ErrorKind::Authorization(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").expect("token pattern is valid")
});

static SESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sid=[A-Za-z0-9]{20,}").expect("session pattern is valid"));

/// Redact access tokens and session ids, and truncate long bodies.
fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let sanitized = TOKEN_PATTERN.replace_all(message, "[REDACTED_TOKEN]");
    let mut sanitized = SESSION_PATTERN
        .replace_all(&sanitized, "sid=[REDACTED]")
        .into_owned();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

/// Salesforce API error response format.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
    fields: Option<Vec<String>>,
}

impl SalesforceErrorResponse {
    fn into_error(self) -> Error {
        Error::new(ErrorKind::SalesforceApi {
            error_code: self.error_code,
            message: sanitize_error_message(&self.message),
            fields: self.fields.unwrap_or_default(),
        })
    }
}
