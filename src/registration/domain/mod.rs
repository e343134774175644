//! Domain model for instance registration.
//!
//! The domain covers event classification, entity references, attribute
//! schemas, the retry policy and its backoff calculation, the retry state
//! machine, and the registration document. Nothing here performs I/O.

mod attempt;
mod classification;
mod document;
mod entity;
mod error;
mod event;
mod ids;
mod policy;
mod schema;

pub use attempt::{DeliveryReport, RetryDecision, RetryPhase, RetryState};
pub use classification::{
    CreatedInstance, EventClass, INSTANCE_CREATE_END, INSTANCE_DELETE_END, INSTANCE_UPDATE,
    InstanceInfo, classify,
};
pub use document::{
    ATTRIBUTE_VALUE_TYPE, AttributeDeclaration, RegistrationDocument, RegistrationProfile,
};
pub use entity::{EntityRef, SERVER_ENTITY_TYPE};
pub use error::{
    ClassificationError, DocumentError, PolicyError, RegistrationTaskError, SchemaError,
};
pub use event::EventMessage;
pub use ids::TaskId;
pub use policy::RetryPolicy;
pub use schema::{AttributeSchema, default_entity_attributes};
