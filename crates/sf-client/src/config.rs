//! Transport settings.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Settings for [`SfHttpClient`](crate::SfHttpClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `None` sends every request exactly once.
    pub retry: Option<RetryConfig>,
    /// Advertise gzip/deflate support and decode compressed bodies.
    pub accept_compressed: bool,
    /// Whole-request timeout. A composite tree insert of 200 records can
    /// take a while, so the default is generous.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Emit a debug event per request and response.
    pub enable_tracing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetryConfig::default()),
            accept_compressed: true,
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`], starting from the defaults.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
