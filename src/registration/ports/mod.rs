//! Port contracts for instance registration.
//!
//! Ports define infrastructure-agnostic interfaces used by the registration
//! services: the notification bus, the HTTP transport towards the context
//! broker, the task scheduler, and the retry timer.

pub mod bus;
pub mod scheduler;
pub mod timer;
pub mod transport;

pub use bus::{BusError, BusResult, EventBus, Subscription};
pub use scheduler::{TaskDescriptor, TaskFuture, TaskHandle, TaskResult, TaskScheduler};
pub use timer::RetryTimer;
pub use transport::{
    RegistryRequest, RegistryTransport, TransportError, TransportResponse, TransportResult,
    XML_CONTENT_TYPE,
};

#[cfg(test)]
pub use transport::MockRegistryTransport;
