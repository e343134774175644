//! Error types for the registration domain.

use thiserror::Error;

/// Errors raised while classifying a bus message.
///
/// A classification error never stops the listener: the message is logged and
/// treated as irrelevant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    /// The message body is not a JSON object.
    #[error("event message is not a JSON object")]
    NotAnObject,

    /// A field needed to classify or identify the event is absent.
    #[error("event message is missing required field `{0}`")]
    MissingField(&'static str),

    /// A field is present with an unexpected JSON type.
    #[error("event field `{field}` must be a {expected}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
}

/// Errors raised by attribute schema lookups and construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The entity type has no attribute list in the schema.
    #[error("entity type '{0}' is not declared in the attribute schema")]
    UnknownEntityType(String),

    /// An entity type key is empty after trimming.
    #[error("attribute schema contains an empty entity type")]
    EmptyEntityType,

    /// An attribute name is empty after trimming.
    #[error("entity type '{entity_type}' declares an empty attribute name")]
    EmptyAttributeName {
        /// Entity type owning the attribute list.
        entity_type: String,
    },

    /// An attribute is listed twice for the same entity type.
    #[error("entity type '{entity_type}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute {
        /// Entity type owning the attribute list.
        entity_type: String,
        /// Repeated attribute name.
        attribute: String,
    },
}

/// Errors raised while constructing a retry policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The backoff factor must be at least one.
    #[error("backoff factor must be at least 1")]
    ZeroFactor,

    /// The minimum delay exceeds the maximum delay.
    #[error("minimum retry delay ({min_secs}s) exceeds maximum retry delay ({max_secs}s)")]
    MinDelayExceedsMax {
        /// Configured minimum delay in seconds.
        min_secs: u64,
        /// Configured maximum delay in seconds.
        max_secs: u64,
    },
}

/// Error returned when a registration document cannot be rendered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render registration document: {0}")]
pub struct DocumentError(pub String);

/// Terminal failure of one registration task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationTaskError {
    /// The entity type is not part of the attribute schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The registration document could not be rendered.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Every allowed attempt failed at the transport level.
    #[error("registration into {endpoint} abandoned after {attempts} failed attempts: {last_reason}")]
    RetriesExhausted {
        /// Registry endpoint the task was delivering to.
        endpoint: String,
        /// Number of failed attempts.
        attempts: u32,
        /// Reason reported by the last failed attempt.
        last_reason: String,
    },
}
