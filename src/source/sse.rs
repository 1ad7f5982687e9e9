//! Server-Sent Events transport.
//!
//! The backend's stream endpoint reads the bearer token from the `token`
//! query parameter, not the `Authorization` header.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{Transport, TransportError, TransportEvent, TransportKind};

/// Path of the realtime stream relative to the API base URL.
pub const REALTIME_PATH: &str = "/admin/realtime";

/// Longest line, and longest joined `data` payload, the decoder will hold.
pub const DEFAULT_MAX_LINE: usize = 1024 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SseEvent {
    /// The `event:` field, if any.
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// Unnamed events (and ones explicitly named `message`) are the ones an
    /// `EventSource.onmessage` handler would see.
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Feed it raw body chunks; it buffers partial lines (including split UTF-8
/// sequences) and returns the events completed by each chunk.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: String,
    has_data: bool,
    event: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
    max_line: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(DEFAULT_MAX_LINE)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that fails once a pending line or event payload exceeds `max_line` bytes.
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: String::new(),
            has_data: false,
            event: None,
            last_event_id: None,
            retry: None,
            max_line,
        }
    }

    /// The reconnection delay last requested by the server with `retry:`.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Decode one body chunk.
    ///
    /// Fails with [`TransportError::Stream`] when the server sends a line (or
    /// an event's joined data) longer than the configured limit.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, TransportError> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
            if self.data.len() > self.max_line {
                return Err(self.overflow());
            }
        }
        if self.buffer.len() > self.max_line {
            return Err(self.overflow());
        }
        Ok(events)
    }

    fn overflow(&mut self) -> TransportError {
        self.buffer.clear();
        self.data.clear();
        self.has_data = false;
        TransportError::Stream(format!("SSE line exceeds {} bytes", self.max_line))
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
                self.has_data = true;
            }
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        Some(SseEvent {
            event,
            data,
            id: self.last_event_id.clone(),
        })
    }
}

/// SSE transport against `<api_url>/admin/realtime`.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: Client,
    url: Url,
    description: String,
    max_line: usize,
}

impl SseTransport {
    /// Create a transport for the given API base URL (e.g. "https://api.example.com").
    pub fn new(api_url: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Self::with_client(client, api_url)
    }

    /// Use an existing HTTP client. It must not set a total request timeout,
    /// or the stream will be cut when it expires.
    pub fn with_client(client: Client, api_url: &str) -> Result<Self, TransportError> {
        let endpoint = format!("{}{}", api_url.trim_end_matches('/'), REALTIME_PATH);
        let url = Url::parse(&endpoint).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client,
            description: format!("sse: {}", url),
            url,
            max_line: DEFAULT_MAX_LINE,
        })
    }

    /// Limit on a single line of the stream; longer lines end the run.
    pub fn max_line(mut self, bytes: usize) -> Self {
        self.max_line = bytes;
        self
    }

    /// The stream URL with the token attached.
    pub fn endpoint(&self, token: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("token", token);
        url
    }
}

#[async_trait]
impl Transport for SseTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(
        &self,
        token: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .get(self.endpoint(token))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(TransportError::Auth(format!(
                    "realtime stream returned {}",
                    response.status()
                )));
            }
            status if !status.is_success() => return Err(TransportError::Status(status.as_u16())),
            _ => {}
        }

        info!(url = %self.url, "SSE stream opened");
        if events.send(TransportEvent::Opened).await.is_err() {
            return Ok(());
        }

        let mut decoder = SseDecoder::with_max_line(self.max_line);
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| TransportError::Stream(e.to_string()))?;
            for event in decoder.feed(&chunk)? {
                if !event.is_message() {
                    debug!(event = ?event.event, "skipping named SSE event");
                    continue;
                }
                if events.send(TransportEvent::Frame(event.data)).await.is_err() {
                    return Ok(());
                }
            }
        }

        info!(url = %self.url, "SSE stream closed by server");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"queue_update\"}\n\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, r#"{"type":"queue_update"}"#);
        assert!(events[0].is_message());
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"da").unwrap().is_empty());
        assert!(decoder.feed(b"ta: hel").unwrap().is_empty());
        assert!(decoder.feed(b"lo\n").unwrap().is_empty());
        let events = decoder.feed(b"\n").unwrap();
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: café\n\n".as_bytes();
        let (a, b) = bytes.split_at(10); // inside the two-byte 'é'
        assert!(decoder.feed(a).unwrap().is_empty());
        let events = decoder.feed(b).unwrap();
        assert_eq!(events[0].data, "café");
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: line1\ndata: line2\n\n").unwrap();
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\r\n\r\ndata:x\r\nid: 7\r\n\r\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(decoder.last_event_id(), Some("7"));
    }

    #[test]
    fn test_named_event_and_retry() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"retry: 3000\nevent: ping\ndata: {}\n\n").unwrap();
        assert_eq!(events[0].event.as_deref(), Some("ping"));
        assert!(!events[0].is_message());
        assert_eq!(decoder.retry(), Some(Duration::from_millis(3000)));

        // event name does not leak into the next event
        let events = decoder.feed(b"data: next\n\n").unwrap();
        assert!(events[0].is_message());
    }

    #[test]
    fn test_blank_lines_without_data_dispatch_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\n\n\nevent: x\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_endpoint_encodes_token() {
        let transport = SseTransport::new("https://api.example.com/").unwrap();
        let url = transport.endpoint("a b+c");
        assert_eq!(url.path(), "/admin/realtime");
        assert_eq!(url.query(), Some("token=a+b%2Bc"));
        assert_eq!(transport.description(), "sse: https://api.example.com/admin/realtime");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            SseTransport::new("not a url"),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_line_without_newline_is_capped() {
        let mut decoder = SseDecoder::with_max_line(16);
        assert!(decoder.feed(b"data: 0123456789").unwrap().is_empty());
        assert!(matches!(decoder.feed(b"abcdef"), Err(TransportError::Stream(_))));
    }

    #[test]
    fn test_joined_data_is_capped() {
        let mut decoder = SseDecoder::with_max_line(16);
        assert!(matches!(
            decoder.feed(b"data: 0123456789\ndata: 0123456789\n"),
            Err(TransportError::Stream(_))
        ));
    }

    /// Serve one `text/event-stream` response, then close the connection.
    /// Resolves to the raw request head.
    async fn serve_stream(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
                status
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), server)
    }

    fn drain(rx: &mut mpsc::Receiver<TransportEvent>) -> Vec<TransportEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_run_forwards_message_events_in_order() {
        let body = ": hello\n\nevent: ping\ndata: {}\n\ndata: one\n\nevent: message\ndata: two\n\n";
        let (base, server) = serve_stream("200 OK", body.to_string()).await;
        let transport = SseTransport::new(&base).unwrap();
        let (tx, mut rx) = mpsc::channel(16);

        transport.run("s3cret", tx).await.unwrap();

        assert_eq!(
            drain(&mut rx),
            vec![
                TransportEvent::Opened,
                TransportEvent::Frame("one".into()),
                TransportEvent::Frame("two".into()),
            ]
        );
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /admin/realtime?token=s3cret "));
        assert!(request.to_lowercase().contains("accept: text/event-stream"));
    }

    #[tokio::test]
    async fn test_run_maps_unauthorized_to_auth() {
        let (base, _server) = serve_stream("401 Unauthorized", String::new()).await;
        let transport = SseTransport::new(&base).unwrap();
        let (tx, mut rx) = mpsc::channel(16);

        let err = transport.run("bad", tx).await.unwrap_err();

        assert!(matches!(err, TransportError::Auth(_)));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_run_maps_server_error_to_status() {
        let (base, _server) = serve_stream("503 Service Unavailable", String::new()).await;
        let transport = SseTransport::new(&base).unwrap();
        let (tx, _rx) = mpsc::channel(16);

        assert!(matches!(transport.run("t", tx).await, Err(TransportError::Status(503))));
    }

    #[tokio::test]
    async fn test_run_ends_on_oversized_line() {
        let body = format!("data: ok\n\ndata: {}", "x".repeat(256));
        let (base, _server) = serve_stream("200 OK", body).await;
        let transport = SseTransport::new(&base).unwrap().max_line(64);
        let (tx, mut rx) = mpsc::channel(16);

        let err = transport.run("t", tx).await.unwrap_err();

        assert!(matches!(err, TransportError::Stream(_)));
        assert_eq!(drain(&mut rx).first(), Some(&TransportEvent::Opened));
    }
}
