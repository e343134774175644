//! Service layer for instance registration.
//!
//! - [`DeliveryClient`] posts one rendered document to the context broker.
//! - [`RegistrationTask`] drives a delivery through the retry state machine.
//! - [`ListenerLoop`] consumes the bus and schedules registration tasks.

mod delivery;
mod listener;
mod task;

pub use delivery::{DeliveryClient, DeliveryOutcome};
pub use listener::{ListenerError, ListenerExit, ListenerLoop, ListenerStats, ListenerSummary};
pub use task::{RegistrationRunner, RegistrationTask};
