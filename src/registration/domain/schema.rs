//! Attribute schema declared for each entity type.

use std::collections::{BTreeMap, HashSet};

use super::{SERVER_ENTITY_TYPE, SchemaError};

/// Returns the attributes registered for each entity type by default.
///
/// Servers expose the metrics collected by the monitoring probes: CPU load,
/// free disk, used memory, process count and logged-in users.
#[must_use]
pub fn default_entity_attributes() -> BTreeMap<String, Vec<String>> {
    let server_attributes = ["cpuLoadPct", "freeSpacePct", "usedMemPct", "procs", "users"]
        .into_iter()
        .map(str::to_owned)
        .collect();
    BTreeMap::from([(SERVER_ENTITY_TYPE.to_owned(), server_attributes)])
}

/// Maps entity types to the ordered attribute names declared on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    types: BTreeMap<String, Vec<String>>,
}

impl AttributeSchema {
    /// Builds a schema, trimming names and validating every attribute list.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when an entity type or attribute name is empty,
    /// or an attribute is repeated within one entity type.
    pub fn new(
        entries: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Result<Self, SchemaError> {
        let mut types = BTreeMap::new();
        for (raw_type, raw_attributes) in entries {
            let entity_type = raw_type.trim().to_owned();
            if entity_type.is_empty() {
                return Err(SchemaError::EmptyEntityType);
            }

            let mut seen = HashSet::new();
            let mut attributes = Vec::with_capacity(raw_attributes.len());
            for raw_attribute in raw_attributes {
                let attribute = raw_attribute.trim().to_owned();
                if attribute.is_empty() {
                    return Err(SchemaError::EmptyAttributeName { entity_type });
                }
                if !seen.insert(attribute.clone()) {
                    return Err(SchemaError::DuplicateAttribute {
                        entity_type,
                        attribute,
                    });
                }
                attributes.push(attribute);
            }
            types.insert(entity_type, attributes);
        }
        Ok(Self { types })
    }

    /// Returns the attributes declared for `entity_type`, in schema order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownEntityType`] when the type is absent.
    pub fn attributes_for(&self, entity_type: &str) -> Result<&[String], SchemaError> {
        self.types
            .get(entity_type)
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::UnknownEntityType(entity_type.to_owned()))
    }

    /// Returns the declared entity types.
    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self {
            types: default_entity_attributes(),
        }
    }
}
