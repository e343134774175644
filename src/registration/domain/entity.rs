//! Entity references registered with the context broker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NGSI entity type used for nova servers.
pub const SERVER_ENTITY_TYPE: &str = "vm";

/// Identifies one monitored resource in the context broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    id: String,
    #[serde(rename = "type")]
    entity_type: String,
}

impl EntityRef {
    /// Creates an entity reference from explicit parts.
    #[must_use]
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
        }
    }

    /// Creates the reference of a server instance: `<region>:<instance_id>`
    /// with type [`SERVER_ENTITY_TYPE`].
    #[must_use]
    pub fn for_server(region: &str, instance_id: &str) -> Self {
        Self::new(format!("{region}:{instance_id}"), SERVER_ENTITY_TYPE)
    }

    /// Returns the entity identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.entity_type)
    }
}
