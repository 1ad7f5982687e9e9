//! Transport abstraction for the realtime push channel.
//!
//! A transport owns one connection at a time. It pushes
//! [`TransportEvent`]s into a bounded channel that the sync client drains,
//! so frames arrive at the reducer in the order the server sent them.
//!
//! Implementations:
//!
//! - [`SseTransport`]: Server-Sent Events, the preferred transport
//! - [`WebSocketTransport`]: fallback when SSE cannot connect
//! - [`ReplayTransport`]: newline-delimited envelopes from a recorded file
//! - [`ChannelTransport`]: frames pushed by an in-process producer

mod channel;
mod replay;
mod sse;
mod websocket;

pub use channel::ChannelTransport;
pub use replay::ReplayTransport;
pub use sse::{SseDecoder, SseEvent, SseTransport};
pub use websocket::WebSocketTransport;

use std::fmt::{self, Debug};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Which kind of transport supplied the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Sse,
    WebSocket,
    Replay,
    Channel,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Sse => "sse",
            TransportKind::WebSocket => "websocket",
            TransportKind::Replay => "replay",
            TransportKind::Channel => "channel",
        };
        f.write_str(name)
    }
}

/// What a running transport reports to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection is established. Sent once, before any frame.
    Opened,
    /// One message body (an envelope's JSON text).
    Frame(String),
}

/// Errors that end a transport run.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("stream error: {0}")]
    Stream(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A live-update connection.
///
/// `run` connects, sends [`TransportEvent::Opened`], then forwards every
/// inbound message as a [`TransportEvent::Frame`] until the connection ends.
/// It returns `Ok(())` when the server closes the connection cleanly and
/// `Err` on failure. Dropping the future closes the connection.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    fn kind(&self) -> TransportKind;

    /// Human-readable description, shown in the status bar.
    fn description(&self) -> &str;

    async fn run(
        &self,
        token: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError>;
}
