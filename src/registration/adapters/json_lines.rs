//! Bus adapter reading one JSON notification per line.
//!
//! Any async reader can feed the listener: the binary uses standard input,
//! so notifications can be piped from whatever consumes the real broker.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::registration::{
    domain::EventMessage,
    ports::{BusError, BusResult, EventBus, Subscription},
};

/// Non-restartable bus over a line-oriented reader.
///
/// Lines are read as raw bytes. Blank lines are skipped. Lines that are not
/// valid UTF-8 JSON are logged and skipped. End of input closes the
/// subscription, and only an I/O error is reported as a lost connection.
#[derive(Debug)]
pub struct JsonLinesEventBus<R> {
    reader: Mutex<Option<R>>,
}

impl<R> JsonLinesEventBus<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Creates a bus reading from `reader`.
    #[must_use]
    pub const fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }
}

#[async_trait]
impl<R> EventBus for JsonLinesEventBus<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn subscribe(&self, topic: &str) -> BusResult<Subscription> {
        let reader = self
            .reader
            .lock()
            .map_err(|err| BusError::connection_lost(std::io::Error::other(err.to_string())))?
            .take()
            .ok_or_else(|| BusError::AlreadySubscribed(topic.to_owned()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(pump_lines(reader, topic.to_owned(), sender));
        Ok(Subscription::new(topic, receiver))
    }
}

async fn pump_lines<R>(
    mut reader: R,
    topic: String,
    sender: mpsc::UnboundedSender<BusResult<EventMessage>>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                debug!(%topic, "notification source reached end of input");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                if sender.send(Err(BusError::connection_lost(err))).is_err() {
                    debug!(%topic, "subscription dropped before read error was reported");
                }
                return;
            }
        }

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let message = match decode_line(&line) {
            Ok(message) => message,
            Err(err) => {
                warn!(%topic, error = %err, "skipping undecodable notification");
                continue;
            }
        };
        if sender.send(Ok(message)).is_err() {
            debug!(%topic, "subscription dropped, stopping reader");
            return;
        }
    }
}

/// Decodes one raw line. Invalid UTF-8 is a decode error like any other.
fn decode_line(line: &[u8]) -> Result<EventMessage, serde_json::Error> {
    EventMessage::from_wire(serde_json::from_slice(line)?)
}
