//! In-memory adapters for tests and local deterministic runs.

mod bus;
mod scheduler;
mod timer;
mod transport;

pub use bus::InMemoryEventBus;
pub use scheduler::DeferredTaskScheduler;
pub use timer::RecordingRetryTimer;
pub use transport::ScriptedRegistryTransport;
