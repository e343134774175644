//! Nova registrar: registers new OpenStack instances with an NGSI9 context
//! broker.
//!
//! The crate listens to nova lifecycle notifications, classifies them, and for
//! every created instance asynchronously delivers a `registerContext` request,
//! retrying failed deliveries under a bounded exponential backoff.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: pure classification, backoff, and document logic
//! - **Ports**: trait interfaces for the bus, the HTTP transport, the task
//!   scheduler, and the retry timer
//! - **Adapters**: `reqwest`, tokio, JSON-lines, and in-memory implementations
//!
//! # Modules
//!
//! - [`registration`]: the registration forwarder
//! - [`config`]: layered, validated configuration
//! - [`observability`]: logging initialisation

pub mod config;
pub mod observability;
pub mod registration;
