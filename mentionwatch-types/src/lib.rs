//! # mentionwatch-types
//!
//! Wire types shared between the mentionwatch backend and the admin console.
//! The backend pushes JSON envelopes over SSE or WebSocket and answers REST
//! calls with a `{ success, data, error }` wrapper; this crate defines both.
//!
//! ## Push envelopes
//!
//! Every pushed message has the shape `{ "type": ..., "data": ..., "timestamp": ... }`.
//! [`Envelope::parse`] decodes it into a tagged [`Message`], one variant per
//! recognised `type`. Unknown types are reported as
//! [`EnvelopeError::UnknownType`] so the caller can log and skip them.
//!
//! ```rust
//! use mentionwatch_types::{Envelope, Message};
//!
//! let raw = r#"{"type":"queue_update","data":{"pending":3,"processing":1,"completed":40,"failed":2},"timestamp":"2024-05-01T10:00:00Z"}"#;
//! let envelope = Envelope::parse(raw).unwrap();
//!
//! match envelope.message {
//!     Message::QueueUpdate(status) => assert_eq!(status.total(), 46),
//!     other => panic!("unexpected {}", other.kind()),
//! }
//! ```
//!
//! ## REST
//!
//! [`ApiResponse`] wraps every REST answer; request bodies such as
//! [`KeywordUpdate`] serialize with the camelCase field names the backend expects.

mod envelope;
mod events;
mod health;
mod queue;
mod rest;

pub use envelope::*;
pub use events::*;
pub use health::*;
pub use queue::*;
pub use rest::*;
