//! Step definitions for instance registration BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
