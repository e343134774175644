//! Classification of nova notifications into lifecycle events.

use serde_json::{Map, Value};

use super::{ClassificationError, EntityRef, EventMessage};

/// Notification emitted once an instance has been built.
pub const INSTANCE_CREATE_END: &str = "compute.instance.create.end";
/// Notification emitted once an instance has been deleted.
pub const INSTANCE_DELETE_END: &str = "compute.instance.delete.end";
/// Notification emitted on every instance state change.
pub const INSTANCE_UPDATE: &str = "compute.instance.update";

const STATE_ACTIVE: &str = "active";
const STATE_DELETED: &str = "deleted";

const EVENT_TYPE: &str = "event_type";
const PAYLOAD: &str = "payload";
const INSTANCE_ID: &str = "payload.instance_id";
const HOSTNAME: &str = "payload.hostname";
const STATE: &str = "payload.state";
const STATE_DESCRIPTION: &str = "payload.state_description";
const CONTEXT_TENANT: &str = "_context_tenant";
const CONTEXT_PROJECT_NAME: &str = "_context_project_name";
const CONTEXT_USER_NAME: &str = "_context_user_name";
const CONTEXT_SERVICE_CATALOG: &str = "_context_service_catalog";
const REGION: &str = "_context_service_catalog[0].endpoints[0].region";

/// Identifying fields of the instance an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    instance_id: String,
    hostname: Option<String>,
    region: Option<String>,
    tenant_id: Option<String>,
    project: Option<String>,
    user: Option<String>,
}

impl InstanceInfo {
    /// Returns the nova instance identifier.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Returns the instance host name, if reported.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Returns the region of the first service catalog entry, if reported.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Returns the tenant of the request context, if reported.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Returns the project name of the request context, if reported.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Returns the user name of the request context, if reported.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// A creation event, carrying the entity to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedInstance {
    entity: EntityRef,
    info: InstanceInfo,
}

impl CreatedInstance {
    /// Returns the entity reference derived from region and instance id.
    #[must_use]
    pub const fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// Returns the instance fields extracted from the event.
    #[must_use]
    pub const fn info(&self) -> &InstanceInfo {
        &self.info
    }

    /// Consumes the event and returns the entity reference.
    #[must_use]
    pub fn into_entity(self) -> EntityRef {
        self.entity
    }
}

/// Outcome of classifying one bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventClass {
    /// An instance became available and should be registered.
    Creation(CreatedInstance),
    /// An instance was removed. Observed only.
    Deletion(InstanceInfo),
    /// Anything else.
    Ignored,
}

impl EventClass {
    /// Returns a short label for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Creation(_) => "creation",
            Self::Deletion(_) => "deletion",
            Self::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Deleted,
}

/// Classifies a bus message.
///
/// `compute.instance.create.end` is a creation and
/// `compute.instance.delete.end` a deletion. `compute.instance.update` counts
/// only once its transition text is empty: state `active` is a creation and
/// state `deleted` a deletion. Every other message is ignored.
///
/// # Errors
///
/// Returns [`ClassificationError`] when a field needed to decide, or to
/// identify the instance of a relevant event, is missing or mistyped.
pub fn classify(message: &EventMessage) -> Result<EventClass, ClassificationError> {
    let object = message
        .body()
        .as_object()
        .ok_or(ClassificationError::NotAnObject)?;
    let event_type = required_str(object, "event_type", EVENT_TYPE)?;

    match lifecycle_of(event_type, object)? {
        Some(Lifecycle::Created) => {
            let info = instance_info(object)?;
            let region = info
                .region
                .as_deref()
                .ok_or(ClassificationError::MissingField(REGION))?;
            let entity = EntityRef::for_server(region, &info.instance_id);
            Ok(EventClass::Creation(CreatedInstance { entity, info }))
        }
        Some(Lifecycle::Deleted) => Ok(EventClass::Deletion(instance_info(object)?)),
        None => Ok(EventClass::Ignored),
    }
}

fn lifecycle_of(
    event_type: &str,
    object: &Map<String, Value>,
) -> Result<Option<Lifecycle>, ClassificationError> {
    match event_type {
        INSTANCE_CREATE_END => Ok(Some(Lifecycle::Created)),
        INSTANCE_DELETE_END => Ok(Some(Lifecycle::Deleted)),
        INSTANCE_UPDATE => {
            let payload = payload_of(object)?;
            if optional_str(payload, "state_description", STATE_DESCRIPTION)? != Some("") {
                return Ok(None);
            }
            match optional_str(payload, "state", STATE)? {
                Some(STATE_ACTIVE) => Ok(Some(Lifecycle::Created)),
                Some(STATE_DELETED) => Ok(Some(Lifecycle::Deleted)),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

fn instance_info(object: &Map<String, Value>) -> Result<InstanceInfo, ClassificationError> {
    let payload = payload_of(object)?;
    Ok(InstanceInfo {
        instance_id: required_str(payload, "instance_id", INSTANCE_ID)?.to_owned(),
        hostname: optional_str(payload, "hostname", HOSTNAME)?.map(str::to_owned),
        region: region_of(object, payload)?,
        tenant_id: context_str(object, payload, CONTEXT_TENANT)?,
        project: context_str(object, payload, CONTEXT_PROJECT_NAME)?,
        user: context_str(object, payload, CONTEXT_USER_NAME)?,
    })
}

fn payload_of(object: &Map<String, Value>) -> Result<&Map<String, Value>, ClassificationError> {
    match object.get("payload") {
        None | Some(Value::Null) => Err(ClassificationError::MissingField(PAYLOAD)),
        Some(Value::Object(payload)) => Ok(payload),
        Some(_) => Err(ClassificationError::InvalidField {
            field: PAYLOAD,
            expected: "object",
        }),
    }
}

fn optional_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<Option<&'a str>, ClassificationError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(ClassificationError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<&'a str, ClassificationError> {
    optional_str(object, key, field)?.ok_or(ClassificationError::MissingField(field))
}

/// Looks a request-context field up at the top level, where nova puts it, then
/// inside the payload.
fn context_str(
    object: &Map<String, Value>,
    payload: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, ClassificationError> {
    let value = match optional_str(object, key, key)? {
        Some(value) => Some(value),
        None => optional_str(payload, key, key)?,
    };
    Ok(value.map(str::to_owned))
}

fn region_of(
    object: &Map<String, Value>,
    payload: &Map<String, Value>,
) -> Result<Option<String>, ClassificationError> {
    let catalog = object
        .get(CONTEXT_SERVICE_CATALOG)
        .filter(|value| !value.is_null())
        .or_else(|| payload.get(CONTEXT_SERVICE_CATALOG))
        .filter(|value| !value.is_null());
    let Some(catalog) = catalog else {
        return Ok(None);
    };

    let entries = catalog
        .as_array()
        .ok_or(ClassificationError::InvalidField {
            field: CONTEXT_SERVICE_CATALOG,
            expected: "list",
        })?;
    let Some(first) = entries.first().and_then(Value::as_object) else {
        return Ok(None);
    };

    let endpoint_region = first
        .get("endpoints")
        .and_then(Value::as_array)
        .and_then(|endpoints| endpoints.first())
        .and_then(Value::as_object)
        .map(|endpoint| optional_str(endpoint, "region", REGION))
        .transpose()?
        .flatten();
    let region = match endpoint_region {
        Some(region) => Some(region),
        None => optional_str(first, "region", REGION)?,
    };
    Ok(region.map(str::to_owned))
}
