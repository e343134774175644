//! Adapter implementations of the registration ports.

pub mod http;
pub mod json_lines;
pub mod memory;
pub mod tokio_runtime;

pub use http::ReqwestRegistryTransport;
pub use json_lines::JsonLinesEventBus;
pub use tokio_runtime::{TokioRetryTimer, TokioTaskScheduler};
