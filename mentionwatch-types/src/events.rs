//! Event-style payloads that accumulate in the console's capped lists.

use serde::{Deserialize, Serialize};

/// Alert severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
    /// Any severity this console does not know; sorts below `Info`.
    #[serde(other)]
    Unknown,
}

impl Severity {
    fn rank(&self) -> u8 {
        match self {
            Severity::Unknown => 0,
            Severity::Info => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
            Severity::Critical => 4,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

/// An alert record, either pushed as `system_alert` or synthesised by the client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl Alert {
    /// Create an alert with the given id, kind and severity.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            severity,
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// An automatic recovery step taken by the backend (queue restart, source failover...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecoveryAction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

/// Something a user did in the product (signup, keyword change, login...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserActivity {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

/// Outcome of one mention digest email.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailDelivery {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl EmailDelivery {
    pub fn is_failure(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "bounced" | "error")
    }
}

/// Rolling sentiment breakdown of recent mentions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentUpdate {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub neutral: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
}

impl SentimentUpdate {
    pub fn total(&self) -> u64 {
        self.positive + self.neutral + self.negative
    }
}
