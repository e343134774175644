//! Single-shot delivery of registration documents.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::registration::{
    domain::{DocumentError, RegistrationDocument},
    ports::{RegistryRequest, RegistryTransport},
};

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The registry answered with this status.
    Success(u16),
    /// No usable answer; the attempt may be retried.
    TransportFailure(String),
}

/// Posts registration documents to the configured registry endpoint.
///
/// Any received response is a success, whatever its status, unless
/// server-error retries are enabled, in which case 5xx answers count as
/// transport failures.
pub struct DeliveryClient<T>
where
    T: RegistryTransport,
{
    transport: Arc<T>,
    endpoint: String,
    retry_server_errors: bool,
}

impl<T> DeliveryClient<T>
where
    T: RegistryTransport,
{
    /// Creates a client posting to `endpoint`.
    #[must_use]
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            retry_server_errors: false,
        }
    }

    /// Treats 5xx answers as retriable failures when `enabled`.
    #[must_use]
    pub const fn with_server_error_retries(mut self, enabled: bool) -> Self {
        self.retry_server_errors = enabled;
        self
    }

    /// Returns the registry endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Renders `document` and posts it once.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the document cannot be rendered; no
    /// request is sent in that case.
    pub async fn send(
        &self,
        document: &RegistrationDocument,
    ) -> Result<DeliveryOutcome, DocumentError> {
        let body = document.to_xml()?;
        let request = RegistryRequest::xml(&self.endpoint, body);
        let entity_id = document.entity_id();

        let response = match self.transport.post_xml(request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(entity_id, endpoint = %self.endpoint, %error, "registration request failed");
                return Ok(DeliveryOutcome::TransportFailure(format!(
                    "post({}): {error}",
                    self.endpoint
                )));
            }
        };

        let status = response.status;
        if self.retry_server_errors && status >= 500 {
            warn!(entity_id, endpoint = %self.endpoint, status, "registry answered with a server error");
            return Ok(DeliveryOutcome::TransportFailure(format!(
                "post({}): registry answered {status}",
                self.endpoint
            )));
        }
        if (200..300).contains(&status) {
            info!(entity_id, endpoint = %self.endpoint, status, "registration delivered");
        } else {
            warn!(entity_id, endpoint = %self.endpoint, status, "registry rejected registration");
            debug!(entity_id, body = %response.body, "registry response body");
        }
        Ok(DeliveryOutcome::Success(status))
    }
}
