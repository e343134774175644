//! `reqwest` transport towards the context broker.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

use crate::registration::ports::{
    RegistryRequest, RegistryTransport, TransportError, TransportResponse, TransportResult,
    XML_CONTENT_TYPE,
};

/// HTTP transport backed by a shared `reqwest` client.
///
/// The client is cheap to clone and safe to share between concurrent tasks.
#[derive(Debug, Clone)]
pub struct ReqwestRegistryTransport {
    client: reqwest::Client,
}

impl ReqwestRegistryTransport {
    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] when the HTTP client cannot
    /// be initialised.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RegistryTransport for ReqwestRegistryTransport {
    async fn post_xml(&self, request: RegistryRequest) -> TransportResult<TransportResponse> {
        let RegistryRequest { url, body, headers } = request;
        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(body).send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let response_body = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                debug!(%url, status, error = %err, "failed to read registry response body");
                String::new()
            }
        };
        Ok(TransportResponse {
            status,
            body: response_body,
        })
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Unreachable(err.to_string())
    }
}
