//! Realtime sync client.
//!
//! The client owns the [`RealtimeSnapshot`]. A supervisor task opens the
//! preferred transport (falling back to the secondary one when it cannot
//! connect), pulls frames through a bounded channel, decodes them and folds
//! them into the snapshot. Consumers only read, through a `watch` channel.
//!
//! ```text
//!  Transport::run ──TransportEvent──▶ mpsc ──▶ supervisor ──apply──▶ watch<ClientState>
//!        ▲                                         │                        │
//!        └──────── reconnect / fallback ◀──────────┘                        ▼
//!                                                                   App, UI, callers
//! ```
//!
//! Reconnection is capped and linear: after a failure the supervisor waits
//! `interval` and tries again, until `max_attempts` consecutive failures.
//! Then it stops and reports a terminal error until [`RealtimeHandle::reconnect`]
//! is called. Dropping the [`RealtimeHandle`] aborts the supervisor, which
//! closes the open connection and cancels any pending retry.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use mentionwatch_types::{Envelope, EnvelopeError};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::data::RealtimeSnapshot;
use crate::source::{Transport, TransportError, TransportEvent, TransportKind};
use crate::token::{StaticToken, TokenProvider};

/// Capped linear reconnect policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Fixed delay between attempts.
    pub interval: Duration,
    /// Consecutive failures after which the client gives up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 5,
        }
    }
}

/// Connection state exposed to consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus {
    pub connected: bool,
    /// Transport currently supplying data.
    pub transport: Option<TransportKind>,
    /// When the last message was applied.
    pub last_update: Option<SystemTime>,
    pub last_error: Option<String>,
    /// Consecutive failed connection attempts.
    pub attempts: u32,
    /// The client has stopped retrying; only a manual reconnect restarts it.
    pub failed: bool,
}

/// Everything a consumer can observe.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub snapshot: RealtimeSnapshot,
    pub connection: ConnectionStatus,
}

/// Terminal client conditions, reported through [`ConnectionStatus::last_error`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no authentication token available")]
    MissingToken,

    #[error("connection failed after {0} attempts")]
    RetriesExhausted(u32),

    #[error("no transport configured")]
    NoTransport,
}

#[derive(Debug)]
enum Command {
    Reconnect,
}

/// Builder for [`RealtimeClient`].
#[derive(Debug)]
pub struct RealtimeClientBuilder {
    primary: Option<Arc<dyn Transport>>,
    fallback: Option<Arc<dyn Transport>>,
    tokens: Arc<dyn TokenProvider>,
    policy: ReconnectPolicy,
    channel_capacity: usize,
}

impl Default for RealtimeClientBuilder {
    fn default() -> Self {
        Self {
            primary: None,
            fallback: None,
            tokens: Arc::new(StaticToken::none()),
            policy: ReconnectPolicy::default(),
            channel_capacity: 64,
        }
    }
}

impl RealtimeClientBuilder {
    /// The preferred transport (normally SSE).
    pub fn primary(mut self, transport: impl Transport + 'static) -> Self {
        self.primary = Some(Arc::new(transport));
        self
    }

    /// Tried only when the primary transport cannot connect.
    pub fn fallback(mut self, transport: impl Transport + 'static) -> Self {
        self.fallback = Some(Arc::new(transport));
        self
    }

    pub fn tokens(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.tokens = Arc::new(provider);
        self
    }

    pub fn policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Capacity of the transport-to-reducer channel (default: 64).
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Start the supervisor. Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<RealtimeHandle, ClientError> {
        let primary = self.primary.ok_or(ClientError::NoTransport)?;
        let (state_tx, state_rx) = watch::channel(ClientState::default());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let supervisor = Supervisor {
            transports: std::iter::once(primary).chain(self.fallback).collect(),
            tokens: self.tokens,
            policy: self.policy,
            channel_capacity: self.channel_capacity,
            state: state_tx,
            commands: command_rx,
        };
        let task = tokio::spawn(supervisor.run());

        Ok(RealtimeHandle {
            state: state_rx,
            commands: command_tx,
            task,
        })
    }
}

/// Entry point for the realtime sync client.
#[derive(Debug)]
pub struct RealtimeClient;

impl RealtimeClient {
    pub fn builder() -> RealtimeClientBuilder {
        RealtimeClientBuilder::default()
    }
}

/// Owner of a running client. Dropping it stops the client.
#[derive(Debug)]
pub struct RealtimeHandle {
    state: watch::Receiver<ClientState>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    /// A copy of the current state.
    pub fn state(&self) -> ClientState {
        self.state.borrow().clone()
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.state.borrow().connection.clone()
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.clone()
    }

    /// Reset the attempt counter and reconnect with the preferred transport.
    ///
    /// Interrupts an open connection or a pending retry, and revives a
    /// client that had given up.
    pub fn reconnect(&self) {
        let _ = self.commands.send(Command::Reconnect);
    }

    /// Stop the client, closing the connection.
    pub fn shutdown(self) {}

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// How one transport run ended.
enum Drive {
    /// The transport ended; `opened` tells whether it ever connected.
    Ended {
        opened: bool,
        result: Result<(), TransportError>,
    },
    Reconnect,
    Shutdown,
}

struct Supervisor {
    transports: Vec<Arc<dyn Transport>>,
    tokens: Arc<dyn TokenProvider>,
    policy: ReconnectPolicy,
    channel_capacity: usize,
    state: watch::Sender<ClientState>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Supervisor {
    async fn run(mut self) {
        let mut failures: u32 = 0;

        'connect: loop {
            let Some(token) = self.tokens.token().await else {
                warn!("no authentication token, not connecting");
                self.update(|c| {
                    c.connected = false;
                    c.transport = None;
                    c.failed = true;
                    c.last_error = Some(ClientError::MissingToken.to_string());
                });
                if !self.wait_for_reconnect().await {
                    return;
                }
                failures = 0;
                continue;
            };

            let mut opened = false;
            let mut last_error: Option<TransportError> = None;

            for transport in self.transports.clone() {
                match self.drive(transport, &token).await {
                    Drive::Ended { opened: true, result } => {
                        opened = true;
                        last_error = result.err();
                        break;
                    }
                    Drive::Ended { opened: false, result } => {
                        last_error = result.err();
                    }
                    Drive::Reconnect => {
                        failures = 0;
                        self.reset();
                        continue 'connect;
                    }
                    Drive::Shutdown => return,
                }
            }

            if opened {
                failures = 0;
            }
            failures += 1;

            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "connection closed".to_string());
            warn!(error = %reason, attempt = failures, "realtime connection lost");
            self.update(|c| {
                c.connected = false;
                c.transport = None;
                c.attempts = failures;
                c.last_error = Some(reason);
            });

            if failures >= self.policy.max_attempts {
                let err = ClientError::RetriesExhausted(failures);
                error!(%err, "giving up on realtime connection");
                self.update(|c| {
                    c.failed = true;
                    c.last_error = Some(err.to_string());
                });
                if !self.wait_for_reconnect().await {
                    return;
                }
                failures = 0;
                self.reset();
                continue;
            }

            info!(
                delay = ?self.policy.interval,
                attempt = failures,
                max = self.policy.max_attempts,
                "scheduling reconnect"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                command = self.commands.recv() => match command {
                    Some(Command::Reconnect) => {
                        failures = 0;
                        self.reset();
                    }
                    None => return,
                },
            }
        }
    }

    /// Run one transport until it ends or a command interrupts it.
    async fn drive(&mut self, transport: Arc<dyn Transport>, token: &str) -> Drive {
        let kind = transport.kind();
        debug!(transport = transport.description(), "opening realtime connection");

        let (tx, mut rx) = mpsc::channel(self.channel_capacity);
        let run = transport.run(token, tx);
        tokio::pin!(run);

        let mut opened = false;
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    return match command {
                        Some(Command::Reconnect) => {
                            info!("manual reconnect requested");
                            Drive::Reconnect
                        }
                        None => Drive::Shutdown,
                    };
                }
                Some(event) = rx.recv() => self.handle_event(kind, event, &mut opened),
                result = &mut run => {
                    while let Ok(event) = rx.try_recv() {
                        self.handle_event(kind, event, &mut opened);
                    }
                    return Drive::Ended { opened, result };
                }
            }
        }
    }

    fn handle_event(&self, kind: TransportKind, event: TransportEvent, opened: &mut bool) {
        match event {
            TransportEvent::Opened => {
                *opened = true;
                info!(transport = %kind, "realtime connection established");
                self.update(|c| {
                    c.connected = true;
                    c.transport = Some(kind);
                    c.attempts = 0;
                    c.failed = false;
                    c.last_error = None;
                });
            }
            TransportEvent::Frame(text) => match Envelope::parse(&text) {
                Ok(envelope) => {
                    debug!(message_type = envelope.message.kind(), "applying message");
                    self.state.send_modify(|state| {
                        state.snapshot.apply(envelope);
                        state.connection.last_update = Some(SystemTime::now());
                    });
                }
                Err(EnvelopeError::UnknownType(kind)) => {
                    warn!(message_type = %kind, "ignoring unknown message type");
                }
                Err(err) => {
                    warn!(error = %err, "dropping malformed message");
                }
            },
        }
    }

    /// Block until a reconnect is requested. False if the handle is gone.
    async fn wait_for_reconnect(&mut self) -> bool {
        match self.commands.recv().await {
            Some(Command::Reconnect) => {
                info!("manual reconnect requested");
                self.reset();
                true
            }
            None => false,
        }
    }

    fn reset(&self) {
        self.update(|c| {
            c.attempts = 0;
            c.failed = false;
            c.last_error = None;
        });
    }

    fn update(&self, f: impl FnOnce(&mut ConnectionStatus)) {
        self.state.send_modify(|state| f(&mut state.connection));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use mentionwatch_types::Severity;

    use crate::source::ChannelTransport;

    /// Transport that fails or connects-and-idles on demand.
    #[derive(Debug)]
    struct Scripted {
        kind: TransportKind,
        runs: Arc<AtomicU32>,
        fail: Arc<AtomicBool>,
        closed: Arc<AtomicBool>,
    }

    impl Scripted {
        fn new(kind: TransportKind, fail: bool) -> Self {
            Self {
                kind,
                runs: Arc::new(AtomicU32::new(0)),
                fail: Arc::new(AtomicBool::new(fail)),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    struct CloseFlag(Arc<AtomicBool>);

    impl Drop for CloseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        fn description(&self) -> &str {
            "scripted"
        }

        async fn run(
            &self,
            _token: &str,
            events: mpsc::Sender<TransportEvent>,
        ) -> Result<(), TransportError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::Connect("refused".into()));
            }
            let _guard = CloseFlag(self.closed.clone());
            let _ = events.send(TransportEvent::Opened).await;
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn fast_policy() -> ReconnectPolicy {
        ReconnectPolicy {
            interval: Duration::from_secs(5),
            max_attempts: 5,
        }
    }

    #[tokio::test]
    async fn test_applies_frames_in_order() {
        let (tx, transport) = ChannelTransport::create("test");
        let handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::new("t"))
            .spawn()
            .unwrap();
        let mut state = handle.subscribe();

        tx.send(r#"{"type":"queue_update","data":{"failed":40,"total":100}}"#.into())
            .await
            .unwrap();
        tx.send("garbage".into()).await.unwrap();
        tx.send(r#"{"type":"heartbeat","data":{}}"#.into()).await.unwrap();
        tx.send(r#"{"type":"queue_error","data":{"error":"boom"},"timestamp":"42"}"#.into())
            .await
            .unwrap();

        let state = state
            .wait_for(|s| !s.snapshot.alerts.is_empty())
            .await
            .unwrap()
            .clone();

        assert!(state.connection.connected);
        assert_eq!(state.connection.transport, Some(TransportKind::Channel));
        assert!(state.connection.last_update.is_some());
        assert_eq!(state.snapshot.queue_status.as_ref().unwrap().failed, 40);
        let alert = state.snapshot.alerts.latest().unwrap();
        assert_eq!(alert.id, "queue_error_42");
        assert_eq!(alert.severity, Severity::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_max_attempts_and_manual_reconnect_resets() {
        let transport = Scripted::new(TransportKind::Sse, true);
        let runs = transport.runs.clone();
        let fail = transport.fail.clone();

        let handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::new("t"))
            .policy(fast_policy())
            .spawn()
            .unwrap();
        let mut state = handle.subscribe();

        let status = state
            .wait_for(|s| s.connection.failed)
            .await
            .unwrap()
            .connection
            .clone();
        assert_eq!(runs.load(Ordering::SeqCst), 5);
        assert_eq!(status.attempts, 5);
        assert!(!status.connected);
        assert_eq!(
            status.last_error.as_deref(),
            Some("connection failed after 5 attempts")
        );

        // No more retries once failed.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 5);

        fail.store(false, Ordering::SeqCst);
        handle.reconnect();

        let status = state
            .wait_for(|s| s.connection.connected)
            .await
            .unwrap()
            .connection
            .clone();
        assert_eq!(runs.load(Ordering::SeqCst), 6);
        assert_eq!(status.attempts, 0);
        assert!(!status.failed);
        assert!(status.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_on_fixed_interval() {
        let transport = Scripted::new(TransportKind::Sse, true);
        let runs = transport.runs.clone();
        let _handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::new("t"))
            .policy(fast_policy())
            .spawn()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_when_primary_cannot_connect() {
        let primary = Scripted::new(TransportKind::Sse, true);
        let fallback = Scripted::new(TransportKind::WebSocket, false);
        let primary_runs = primary.runs.clone();
        let fallback_runs = fallback.runs.clone();

        let handle = RealtimeClient::builder()
            .primary(primary)
            .fallback(fallback)
            .tokens(StaticToken::new("t"))
            .spawn()
            .unwrap();
        let mut state = handle.subscribe();

        let status = state
            .wait_for(|s| s.connection.connected)
            .await
            .unwrap()
            .connection
            .clone();
        assert_eq!(status.transport, Some(TransportKind::WebSocket));
        assert_eq!(primary_runs.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_not_used_when_primary_connects() {
        let primary = Scripted::new(TransportKind::Sse, false);
        let fallback = Scripted::new(TransportKind::WebSocket, false);
        let fallback_runs = fallback.runs.clone();

        let handle = RealtimeClient::builder()
            .primary(primary)
            .fallback(fallback)
            .tokens(StaticToken::new("t"))
            .spawn()
            .unwrap();
        let mut state = handle.subscribe();
        state.wait_for(|s| s.connection.connected).await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fallback_runs.load(Ordering::SeqCst), 0);
        assert_eq!(handle.connection().transport, Some(TransportKind::Sse));
    }

    #[tokio::test]
    async fn test_missing_token_is_terminal() {
        let transport = Scripted::new(TransportKind::Sse, false);
        let runs = transport.runs.clone();
        let handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::none())
            .spawn()
            .unwrap();
        let mut state = handle.subscribe();

        let status = state
            .wait_for(|s| s.connection.failed)
            .await
            .unwrap()
            .connection
            .clone();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(
            status.last_error.as_deref(),
            Some("no authentication token available")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_closes_connection() {
        let transport = Scripted::new(TransportKind::Sse, false);
        let closed = transport.closed.clone();
        let handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::new("t"))
            .spawn()
            .unwrap();
        let mut state = handle.subscribe();
        state.wait_for(|s| s.connection.connected).await.unwrap();
        assert!(!closed.load(Ordering::SeqCst));

        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(closed.load(Ordering::SeqCst));
        // The sender went away with the task, so no further updates arrive.
        assert!(state.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_pending_retry() {
        let transport = Scripted::new(TransportKind::Sse, true);
        let runs = transport.runs.clone();
        let handle = RealtimeClient::builder()
            .primary(transport)
            .tokens(StaticToken::new("t"))
            .policy(fast_policy())
            .spawn()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_spawn_without_transport_fails() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        assert!(matches!(
            RealtimeClient::builder().spawn(),
            Err(ClientError::NoTransport)
        ));
    }
}
