//! Scripted registry transport.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::registration::ports::{
    RegistryRequest, RegistryTransport, TransportError, TransportResponse, TransportResult,
};

/// Transport answering from a script and recording every request.
///
/// Scripted answers are consumed in order; once the script is exhausted the
/// fallback answer is returned (`200` with an empty body unless changed).
#[derive(Debug, Clone)]
pub struct ScriptedRegistryTransport {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug)]
struct ScriptState {
    script: VecDeque<TransportResult<TransportResponse>>,
    fallback: TransportResult<TransportResponse>,
    requests: Vec<RegistryRequest>,
}

impl Default for ScriptedRegistryTransport {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                script: VecDeque::new(),
                fallback: Ok(status_response(200)),
                requests: Vec::new(),
            })),
        }
    }
}

impl ScriptedRegistryTransport {
    /// Creates a transport that answers `200` to everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose every request fails with `error`.
    #[must_use]
    pub fn always_failing(error: TransportError) -> Self {
        let transport = Self::default();
        transport.lock().fallback = Err(error);
        transport
    }

    /// Queues a response with `status`.
    #[must_use]
    pub fn then_respond(self, status: u16) -> Self {
        self.lock().script.push_back(Ok(status_response(status)));
        self
    }

    /// Queues a transport failure.
    #[must_use]
    pub fn then_fail(self, error: TransportError) -> Self {
        self.lock().script.push_back(Err(error));
        self
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RegistryRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RegistryTransport for ScriptedRegistryTransport {
    async fn post_xml(&self, request: RegistryRequest) -> TransportResult<TransportResponse> {
        let mut state = self.lock();
        state.requests.push(request);
        let scripted = state.script.pop_front();
        scripted.unwrap_or_else(|| state.fallback.clone())
    }
}

fn status_response(status: u16) -> TransportResponse {
    TransportResponse {
        status,
        body: String::new(),
    }
}
