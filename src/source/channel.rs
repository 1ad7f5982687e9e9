//! Channel-based transport.
//!
//! Receives envelope frames from an in-process producer. This is useful when
//! another component already holds the backend connection, and for driving
//! the console without a network.

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{Transport, TransportError, TransportEvent, TransportKind};

/// A transport whose frames are pushed through a channel.
///
/// The connection counts as open while the producer's sender is alive; once
/// it is dropped and the buffer is drained, the run ends and later runs fail
/// to connect.
///
/// # Example
///
/// ```
/// use mentionwatch::ChannelTransport;
///
/// let (tx, transport) = ChannelTransport::create("in-process");
/// ```
#[derive(Debug)]
pub struct ChannelTransport {
    receiver: Mutex<mpsc::Receiver<String>>,
    description: String,
}

impl ChannelTransport {
    pub fn new(receiver: mpsc::Receiver<String>, source_description: &str) -> Self {
        Self {
            receiver: Mutex::new(receiver),
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a (sender, transport) pair.
    pub fn create(source_description: &str) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(64);
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Channel
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(
        &self,
        _token: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let mut receiver = self
            .receiver
            .try_lock()
            .map_err(|_| TransportError::Connect("channel already in use".to_string()))?;

        if receiver.is_closed() && receiver.is_empty() {
            return Err(TransportError::Connect("producer closed".to_string()));
        }

        if events.send(TransportEvent::Opened).await.is_err() {
            return Ok(());
        }

        while let Some(frame) = receiver.recv().await {
            if events.send(TransportEvent::Frame(frame)).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}
