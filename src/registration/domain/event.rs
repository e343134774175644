//! Bus message wrapper.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const OSLO_MESSAGE_KEY: &str = "oslo.message";

/// A decoded notification received from the bus.
///
/// The body is kept as an opaque JSON value; [`super::classify`] extracts the
/// fields it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventMessage(Value);

impl EventMessage {
    /// Wraps an already decoded message body.
    #[must_use]
    pub const fn new(body: Value) -> Self {
        Self(body)
    }

    /// Decodes a message as it arrives on the wire.
    ///
    /// Messages wrapped in an oslo messaging envelope carry the notification
    /// as a JSON string under `oslo.message`; the envelope is removed.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when the enveloped message is not valid
    /// JSON.
    pub fn from_wire(body: Value) -> Result<Self, serde_json::Error> {
        match body.get(OSLO_MESSAGE_KEY) {
            Some(Value::String(inner)) => Ok(Self(serde_json::from_str(inner)?)),
            _ => Ok(Self(body)),
        }
    }

    /// Returns the `event_type` field when present and textual.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.0.get("event_type").and_then(Value::as_str)
    }

    /// Returns the raw message body.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for EventMessage {
    fn from(body: Value) -> Self {
        Self::new(body)
    }
}
