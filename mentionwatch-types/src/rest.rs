//! REST response wrapper and admin request/response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every admin REST endpoint answers `{ success, data?, error? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Collapse the wrapper into the payload or the server's error text.
    ///
    /// A successful response without `data` is an error for endpoints that
    /// return a body; use [`ApiResponse::into_ack`] for the ones that don't.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response contained no data".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "request failed".to_string())),
        }
    }

    /// Like [`ApiResponse::into_result`] but ignores the payload.
    pub fn into_ack(self) -> Result<(), String> {
        if self.success {
            Ok(())
        } else {
            Err(self.error.unwrap_or_else(|| "request failed".to_string()))
        }
    }
}

/// Aggregate user statistics for the users dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    #[serde(default, alias = "total_users")]
    pub total_users: u64,
    #[serde(default, alias = "active_users")]
    pub active_users: u64,
    #[serde(default, alias = "new_users_today")]
    pub new_users_today: u64,
    #[serde(default, alias = "total_mentions")]
    pub total_mentions: u64,
    #[serde(default, alias = "mentions_today")]
    pub mentions_today: u64,
}

/// One row of the backend error log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}

/// A failed queue entry, as listed by the queue error monitor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueErrorEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "user_id")]
    pub user_id: String,
    #[serde(default, alias = "source_type")]
    pub source_type: String,
    #[serde(default, alias = "error_type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, alias = "error_message")]
    pub error_message: String,
    #[serde(default, alias = "retry_count")]
    pub retry_count: u32,
    #[serde(default, alias = "created_at")]
    pub created_at: String,
}

/// Body of `PUT /admin/users/keyword`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordUpdate {
    pub user_id: String,
    pub keyword: String,
}

/// Body of `PUT /admin/sources/preferences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePreferenceUpdate {
    pub user_id: String,
    pub source_type: String,
    pub preferences: BTreeMap<String, serde_json::Value>,
}

impl SourcePreferenceUpdate {
    /// Preference update that only flips the `enabled` flag for a source.
    pub fn enabled(
        user_id: impl Into<String>,
        source_type: impl Into<String>,
        enabled: bool,
    ) -> Self {
        let mut preferences = BTreeMap::new();
        preferences.insert("enabled".to_string(), serde_json::Value::Bool(enabled));
        Self {
            user_id: user_id.into(),
            source_type: source_type.into(),
            preferences,
        }
    }
}

/// Body of `POST /admin/queue/reset`. Empty fields reset every queue.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueReset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

/// Result of a queue reset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    #[serde(default, alias = "reset_count")]
    pub reset_count: u64,
}
