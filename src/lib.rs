//! # mentionwatch
//!
//! A realtime admin console and client library for a mention-monitoring
//! backend. It keeps a live view of queue processing, backend and API source
//! health, alerts, recovery actions, user activity and email delivery, fed by
//! the backend's push channel, and drives the admin REST endpoints.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐  frames  ┌──────────┐  watch  ┌───────┐   ┌──────┐ │
//! │  │ source   │─────────▶│ client   │────────▶│  app  │──▶│  ui  │ │
//! │  │(transport)          │(snapshot)│         │(state)│   │      │ │
//! │  └──────────┘          └──────────┘         └───┬───┘   └──────┘ │
//! │   SSE | WebSocket | Replay | Channel            │ actions        │
//! │                                                 ▼                │
//! │                                            ┌─────────┐           │
//! │                                            │   api   │ REST      │
//! │                                            └─────────┘           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Transport abstraction ([`Transport`] trait) for the push channel
//! - **[`client`]**: The sync client: reconnect policy, fallback, and the owned snapshot
//! - **[`data`]**: Capped lists, the [`RealtimeSnapshot`] reducer, health predicates, history
//! - **[`api`]**: Admin REST client and error guidance
//! - **[`app`]** / **[`ui`]**: Console state and ratatui rendering
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Live console against a backend
//! mentionwatch --api-url https://api.example.com --token $ADMIN_TOKEN
//!
//! # Replay a recorded session
//! mentionwatch --replay session.ndjson
//! ```
//!
//! ### As a library
//!
//! ```
//! use mentionwatch::{ChannelTransport, RealtimeClient, StaticToken};
//!
//! # tokio_test::block_on(async {
//! let (tx, transport) = ChannelTransport::create("in-process");
//! let handle = RealtimeClient::builder()
//!     .primary(transport)
//!     .tokens(StaticToken::new("admin-token"))
//!     .spawn()
//!     .unwrap();
//!
//! tx.send(r#"{"type":"queue_update","data":{"failed":40,"total":100}}"#.to_string())
//!     .await
//!     .unwrap();
//!
//! let mut state = handle.subscribe();
//! let state = state.wait_for(|s| s.snapshot.queue_status.is_some()).await.unwrap();
//! assert_eq!(state.snapshot.queue_status.as_ref().unwrap().failed, 40);
//! # });
//! ```

pub mod actions;
pub mod api;
pub mod app;
pub mod client;
pub mod data;
pub mod events;
pub mod prefs;
pub mod settings;
pub mod source;
pub mod token;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use client::{
    ClientError, ClientState, ConnectionStatus, RealtimeClient, RealtimeHandle, ReconnectPolicy,
};
pub use data::{CappedList, HealthStatus, History, RealtimeSnapshot, Thresholds};
pub use settings::Settings;
pub use source::{
    ChannelTransport, ReplayTransport, SseTransport, Transport, TransportError, TransportEvent,
    TransportKind, WebSocketTransport,
};
pub use token::{EnvToken, StaticToken, TokenProvider};
