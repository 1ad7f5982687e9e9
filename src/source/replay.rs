//! Replay transport.
//!
//! Reads newline-delimited envelopes from a recorded session file and plays
//! them back as if they came from the live stream.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use super::{Transport, TransportError, TransportEvent, TransportKind};

/// A transport that replays a file of newline-delimited JSON envelopes.
///
/// Blank lines are skipped. After the last line the connection stays open
/// (like an idle live stream) unless [`ReplayTransport::close_at_end`] is set.
#[derive(Debug, Clone)]
pub struct ReplayTransport {
    path: PathBuf,
    description: String,
    pace: Option<Duration>,
    close_at_end: bool,
}

impl ReplayTransport {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("replay: {}", path.display());
        Self {
            path,
            description,
            pace: None,
            close_at_end: false,
        }
    }

    /// Delay between frames, to watch a recording unfold.
    pub fn pace(mut self, delay: Duration) -> Self {
        self.pace = Some(delay);
        self
    }

    /// End the run at EOF instead of idling.
    pub fn close_at_end(mut self, close: bool) -> Self {
        self.close_at_end = close;
        self
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Replay
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(
        &self,
        _token: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<(), TransportError> {
        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();

        if events.send(TransportEvent::Opened).await.is_err() {
            return Ok(());
        }

        let mut count = 0usize;
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(delay) = self.pace {
                tokio::time::sleep(delay).await;
            }
            if events.send(TransportEvent::Frame(line.to_string())).await.is_err() {
                return Ok(());
            }
            count += 1;
        }

        info!(path = %self.path.display(), frames = count, "replay finished");
        if !self.close_at_end {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}
