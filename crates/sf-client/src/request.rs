//! Replayable request descriptions.

use std::collections::BTreeMap;

/// HTTP method used by the data APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

impl From<RequestMethod> for reqwest::Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
        }
    }
}

/// A request that has not been sent yet.
///
/// Held as plain data so the retry loop can send it again.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: BTreeMap<&'static str, String>,
    pub(crate) body: Option<String>,
    pub(crate) bearer_token: Option<String>,
}

impl RequestBuilder {
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            bearer_token: None,
        }
    }

    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Attach a body that is sent verbatim with the given content type.
    ///
    /// Tree files go out this way, JSON or XML, after reference substitution.
    pub fn raw(mut self, body: impl Into<String>, content_type: &str) -> Self {
        self.body = Some(body.into());
        self.headers.insert("Content-Type", content_type.to_string());
        self
    }

    /// Ask for a JSON response whatever the request format.
    pub fn accept_json(mut self) -> Self {
        self.headers
            .insert("Accept", "application/json".to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_carries_token() {
        let req = RequestBuilder::new(RequestMethod::Get, "https://example.com/query")
            .bearer_auth("token123");

        assert_eq!(req.method, RequestMethod::Get);
        assert_eq!(req.bearer_token.as_deref(), Some("token123"));
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_raw_xml_body() {
        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com")
            .raw("<SObjectTreeRequest/>", "application/xml")
            .accept_json();

        assert_eq!(req.body.as_deref(), Some("<SObjectTreeRequest/>"));
        assert_eq!(
            req.headers.get("Content-Type").map(String::as_str),
            Some("application/xml")
        );
        assert_eq!(
            req.headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(reqwest::Method::from(req.method), reqwest::Method::POST);
    }
}
