//! Core HTTP client with retry and Salesforce-specific handling.

use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::{Response, ResponseExt};
use crate::retry::RetryPolicy;

/// HTTP client for Salesforce APIs with built-in retry and error handling.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let accept_compressed = config.accept_compressed;
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(accept_compressed)
            .deflate(accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Execute a request with retry, converting non-success responses into
    /// errors.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.execute_raw(request).await?.check_salesforce_error().await
    }

    /// Execute a request with retry but hand back non-success responses
    /// (other than 429 and retryable 5xx) untouched.
    ///
    /// Composite tree inserts answer HTTP 400 with a structured
    /// `{hasErrors: true, results: [...]}` body that callers need to read.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute_raw(&self, request: RequestBuilder) -> Result<Response> {
        let mut retry_policy = self
            .config
            .retry
            .as_ref()
            .map(|c| RetryPolicy::new(c.clone()));

        loop {
            match self.execute_once(&request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => {
                    let Some(policy) = retry_policy.as_mut() else {
                        return Err(err);
                    };

                    if let Some(delay) = policy.next_delay(err.retry_after()) {
                        warn!(
                            attempt = policy.attempt(),
                            delay_ms = delay.as_millis(),
                            error = %err,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(Error::with_source(
                        ErrorKind::RetriesExhausted {
                            attempts: policy.attempt(),
                        },
                        err,
                    ));
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn execute_once(&self, request: &RequestBuilder) -> Result<Response> {
        let mut req = self.inner.request(request.method.into(), &request.url);

        if let Some(token) = &request.bearer_token {
            req = req.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            req = req.header(*name, value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        if self.config.enable_tracing {
            debug!(method = ?request.method, url = %request.url, "Sending request");
        }

        let response = Response::new(req.send().await?);
        let status = response.status();

        if self.config.enable_tracing {
            if response.is_success() {
                debug!(status, "Response received");
            } else {
                info!(status, "Non-success response");
            }
            if let Some(usage) = response.api_usage() {
                debug!(used = usage.used, remaining = usage.remaining(), "API usage");
            }
        }

        if status == 429 {
            return Err(Error::new(ErrorKind::RateLimited {
                retry_after: response.retry_after(),
            }));
        }

        if matches!(status, 500 | 502 | 503 | 504) {
            return Err(Error::new(ErrorKind::Http {
                status,
                message: format!("Server error: {}", status),
            }));
        }

        Ok(response)
    }
}
