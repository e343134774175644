//! HTTP transport port towards the context broker.

use async_trait::async_trait;
use thiserror::Error;

/// Content type of NGSI9 XML requests.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf8";

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// One outbound XML request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    /// Target URL.
    pub url: String,
    /// XML body.
    pub body: String,
    /// Extra headers besides the content type.
    pub headers: Vec<(String, String)>,
}

impl RegistryRequest {
    /// Creates an XML request without extra headers.
    #[must_use]
    pub fn xml(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response received from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: String,
}

/// Request/response transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Posts an XML document with `Content-Type: application/xml` and waits for
    /// the response. Never retries.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    async fn post_xml(&self, request: RegistryRequest) -> TransportResult<TransportResponse>;
}

/// Reasons a request produced no response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint could not be reached.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    /// No response arrived before the request timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request could not be built (bad URL or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
