//! Instance registration forwarding.
//!
//! This module turns nova instance lifecycle notifications into NGSI9
//! `registerContext` requests for a context broker. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`] (classification, backoff, documents, retry state)
//! - Port contracts in [`ports`] (bus, transport, scheduler, timer)
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`] (delivery, retry task, listener)

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
