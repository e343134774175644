//! NGSI9 `registerContext` documents.

use minijinja::Environment;
use serde::Serialize;

use super::{AttributeSchema, DocumentError, EntityRef, SchemaError};

/// Value type declared for every registered attribute.
pub const ATTRIBUTE_VALUE_TYPE: &str = "string";

const REGISTER_CONTEXT_TEMPLATE: &str = r#"<?xml version="1.0"?>
<registerContextRequest>
  <contextRegistrationList>
    <contextRegistration>
      <entityIdList>
        <entityId type="{{ entity_type|xml }}" isPattern="false">
          <id>{{ entity_id|xml }}</id>
        </entityId>
      </entityIdList>
      <contextRegistrationAttributeList>
{%- for attribute in attributes %}
        <contextRegistrationAttribute>
          <name>{{ attribute.name|xml }}</name>
          <type>{{ attribute.value_type|xml }}</type>
          <isDomain>{{ attribute.is_domain }}</isDomain>
        </contextRegistrationAttribute>
{%- endfor %}
      </contextRegistrationAttributeList>
      <providingApplication>{{ providing_application|xml }}</providingApplication>
    </contextRegistration>
  </contextRegistrationList>
  <duration>{{ duration|xml }}</duration>
</registerContextRequest>
"#;

/// One attribute declared in a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDeclaration {
    /// Attribute name.
    pub name: String,
    /// Declared value type, always [`ATTRIBUTE_VALUE_TYPE`].
    pub value_type: &'static str,
    /// Whether the attribute describes the domain rather than the entity.
    pub is_domain: bool,
}

impl AttributeDeclaration {
    /// Declares a string-typed, non-domain attribute.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ATTRIBUTE_VALUE_TYPE,
            is_domain: false,
        }
    }
}

/// Single-entity, single-registration `registerContext` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationDocument {
    entity_id: String,
    entity_type: String,
    attributes: Vec<AttributeDeclaration>,
    providing_application: String,
    duration: String,
}

impl RegistrationDocument {
    /// Builds the registration of one entity, declaring the attributes listed
    /// for its type in schema order.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownEntityType`] when `entity_type` is not in
    /// `schema`.
    pub fn build(
        entity_id: &str,
        entity_type: &str,
        providing_app_url: &str,
        duration: &str,
        schema: &AttributeSchema,
    ) -> Result<Self, SchemaError> {
        let attributes = schema
            .attributes_for(entity_type)?
            .iter()
            .map(AttributeDeclaration::new)
            .collect();
        Ok(Self {
            entity_id: entity_id.to_owned(),
            entity_type: entity_type.to_owned(),
            attributes,
            providing_application: providing_app_url.to_owned(),
            duration: duration.to_owned(),
        })
    }

    /// Returns the registered entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Returns the registered entity type.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the attribute declarations in schema order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeDeclaration] {
        &self.attributes
    }

    /// Returns the providing application URL.
    #[must_use]
    pub fn providing_application(&self) -> &str {
        &self.providing_application
    }

    /// Returns the registration duration (ISO 8601).
    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Renders the document as NGSI9 XML.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when template rendering fails.
    pub fn to_xml(&self) -> Result<String, DocumentError> {
        let mut environment = Environment::new();
        environment.add_filter("xml", escape_xml);
        environment
            .render_str(REGISTER_CONTEXT_TEMPLATE, self)
            .map_err(|error| DocumentError(error.to_string()))
    }
}

/// Registration settings shared by every task: where the data comes from, how
/// long the registration lasts, and which attributes each type declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationProfile {
    providing_application: String,
    duration: String,
    schema: AttributeSchema,
}

impl RegistrationProfile {
    /// Creates a registration profile.
    #[must_use]
    pub fn new(
        providing_application: impl Into<String>,
        duration: impl Into<String>,
        schema: AttributeSchema,
    ) -> Self {
        Self {
            providing_application: providing_application.into(),
            duration: duration.into(),
            schema,
        }
    }

    /// Returns the providing application URL.
    #[must_use]
    pub fn providing_application(&self) -> &str {
        &self.providing_application
    }

    /// Returns the registration duration.
    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// Returns the attribute schema.
    #[must_use]
    pub const fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    /// Builds the registration document of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownEntityType`] when the entity type is not
    /// in the schema.
    pub fn document_for(&self, entity: &EntityRef) -> Result<RegistrationDocument, SchemaError> {
        RegistrationDocument::build(
            entity.id(),
            entity.entity_type(),
            &self.providing_application,
            &self.duration,
            &self.schema,
        )
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
