//! Admin actions triggered from the console.
//!
//! Each action is a single request/response exchange with the admin API. The
//! [`Dispatcher`] runs it on the tokio runtime and reports an [`Outcome`]
//! back to the UI thread, which turns it into a toast or fresh data.

use mentionwatch_types::{
    ApiHealth, ErrorLogEntry, KeywordUpdate, QueueErrorEntry, QueueReset,
    SourcePreferenceUpdate, UserStats,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::{AdminApi, ErrorLogQuery};

/// Number of queue errors fetched for the Errors view.
pub const QUEUE_ERROR_LIMIT: u32 = 50;

/// Number of log entries fetched for the Logs view.
pub const ERROR_LOG_LIMIT: u32 = 100;

/// A request the console can make against the admin API.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ResetQueue(QueueReset),
    RefreshErrors,
    RefreshErrorLogs,
    RefreshApiHealth,
    RefreshUserStats,
    UpdateKeyword(KeywordUpdate),
    ToggleSource(SourcePreferenceUpdate),
}

impl Action {
    /// Parse the keyword prompt: `<user_id> <keyword...>`.
    pub fn parse_keyword(input: &str) -> Result<Action, String> {
        let (user_id, keyword) = input
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(|| "usage: <user_id> <keyword>".to_string())?;
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err("keyword must not be empty".to_string());
        }
        Ok(Action::UpdateKeyword(KeywordUpdate {
            user_id: user_id.to_string(),
            keyword: keyword.to_string(),
        }))
    }

    /// Parse the source toggle prompt: `<user_id> <source> on|off`.
    pub fn parse_source_toggle(input: &str) -> Result<Action, String> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let [user_id, source, state] = parts.as_slice() else {
            return Err("usage: <user_id> <source> on|off".to_string());
        };
        let enabled = match state.to_ascii_lowercase().as_str() {
            "on" | "true" | "enable" | "enabled" => true,
            "off" | "false" | "disable" | "disabled" => false,
            other => return Err(format!("expected on or off, got {:?}", other)),
        };
        Ok(Action::ToggleSource(SourcePreferenceUpdate::enabled(
            *user_id, *source, enabled,
        )))
    }

    /// Parse the reset prompt: empty for all queues, or `<user_id> [source]`.
    pub fn parse_reset(input: &str) -> Action {
        let mut parts = input.split_whitespace();
        Action::ResetQueue(QueueReset {
            user_id: parts.next().map(str::to_string),
            source_type: parts.next().map(str::to_string),
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::ResetQueue(_) => "reset queue",
            Action::RefreshErrors => "refresh errors",
            Action::RefreshErrorLogs => "refresh error logs",
            Action::RefreshApiHealth => "refresh API health",
            Action::RefreshUserStats => "refresh user stats",
            Action::UpdateKeyword(_) => "update keyword",
            Action::ToggleSource(_) => "update source",
        }
    }
}

/// Result of an action, delivered to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Success message for a toast.
    Done(String),
    /// Failure message for a toast.
    Failed(String),
    QueueErrors(Vec<QueueErrorEntry>),
    ErrorLogs(Vec<ErrorLogEntry>),
    ApiHealth(ApiHealth),
    UserStats(UserStats),
}

/// Run one action to completion.
pub async fn execute(api: &AdminApi, action: Action) -> Outcome {
    let label = action.label();
    let result = match action {
        Action::ResetQueue(reset) => api
            .reset_queue(&reset)
            .await
            .map(|summary| Outcome::Done(format!("Reset {} queue items", summary.reset_count))),
        Action::RefreshErrors => api
            .queue_errors(&ErrorLogQuery::default().limit(QUEUE_ERROR_LIMIT))
            .await
            .map(Outcome::QueueErrors),
        Action::RefreshErrorLogs => api
            .error_logs(&ErrorLogQuery::default().limit(ERROR_LOG_LIMIT))
            .await
            .map(Outcome::ErrorLogs),
        Action::RefreshApiHealth => api.api_health().await.map(Outcome::ApiHealth),
        Action::RefreshUserStats => api.user_stats().await.map(Outcome::UserStats),
        Action::UpdateKeyword(update) => api
            .update_brand_keyword(&update)
            .await
            .map(|()| {
                Outcome::Done(format!(
                    "Keyword for {} set to {:?}",
                    update.user_id, update.keyword
                ))
            }),
        Action::ToggleSource(update) => {
            let state = match update.preferences.get("enabled") {
                Some(serde_json::Value::Bool(false)) => "disabled",
                _ => "enabled",
            };
            api.update_source_preferences(&update).await.map(|()| {
                Outcome::Done(format!("{} {} for {}", update.source_type, state, update.user_id))
            })
        }
    };

    match result {
        Ok(outcome) => {
            info!(action = label, "admin action succeeded");
            outcome
        }
        Err(err) => {
            warn!(action = label, error = %err, "admin action failed");
            Outcome::Failed(format!("Failed to {}: {}", label, err))
        }
    }
}

/// Spawns actions on the runtime and collects their outcomes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    api: AdminApi,
    outcomes: mpsc::UnboundedSender<Outcome>,
}

impl Dispatcher {
    pub fn new(api: AdminApi) -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { api, outcomes: tx }, rx)
    }

    /// Run the action in the background. Must be called within a runtime.
    pub fn dispatch(&self, action: Action) {
        let api = self.api.clone();
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let _ = outcomes.send(execute(&api, action).await);
        });
    }
}
