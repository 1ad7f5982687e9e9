//! WebSocket fallback transport.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{info, warn};

use super::{Transport, TransportError, TransportEvent, TransportKind};

/// Path of the admin socket relative to the WebSocket base URL.
pub const WEBSOCKET_PATH: &str = "/ws/admin";

/// WebSocket transport against `wss://<host>/ws/admin`.
///
/// Each text frame carries one envelope, the same shape as the SSE stream.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    url: Url,
    description: String,
}

impl WebSocketTransport {
    /// Create a transport from a full socket URL (`ws://` or `wss://`).
    pub fn new(url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(format!(
                "expected ws:// or wss://, got {}://",
                url.scheme()
            )));
        }
        Ok(Self {
            description: format!("websocket: {}", url),
            url,
        })
    }

    /// Derive the socket URL from the REST base URL: `https://host` becomes
    /// `wss://host/ws/admin`.
    pub fn from_api_url(api_url: &str) -> Result<Self, TransportError> {
        let trimmed = api_url.trim_end_matches('/');
        let ws = if let Some(rest) = trimmed.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(TransportError::InvalidUrl(api_url.to_string()));
        };
        Self::new(&format!("{}{}", ws, WEBSOCKET_PATH))
    }

    pub fn endpoint(&self, token: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("token", token);
        url
    }
}

fn map_ws_error(err: WsError) -> TransportError {
    match err {
        WsError::Http(response) => {
            let status = response.status().as_u16();
            if matches!(status, 401 | 403) {
                TransportError::Auth(format!("websocket upgrade returned {}", status))
            } else {
                TransportError::Status(status)
            }
        }
        WsError::Io(e) => TransportError::Io(e),
        other => TransportError::Connect(other.to_string()),
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(
        &self,
        token: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let (mut socket, _) = tokio_tungstenite::connect_async(self.endpoint(token).as_str())
            .await
            .map_err(map_ws_error)?;

        info!(url = %self.url, "WebSocket connected");
        if events.send(TransportEvent::Opened).await.is_err() {
            return Ok(());
        }

        // Pongs are queued by tungstenite and flushed as we keep reading.
        while let Some(message) = socket.next().await {
            let text = match message.map_err(|e| TransportError::Stream(e.to_string()))? {
                WsMessage::Text(text) => text,
                WsMessage::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("dropping non-UTF-8 binary frame");
                        continue;
                    }
                },
                WsMessage::Close(frame) => {
                    info!(?frame, "WebSocket closed by server");
                    return Ok(());
                }
                _ => continue,
            };

            if events.send(TransportEvent::Frame(text)).await.is_err() {
                return Ok(());
            }
        }

        Ok(())
    }
}
