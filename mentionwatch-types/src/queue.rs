//! Queue payloads: state counts, recent activity and processing errors.

use serde::{Deserialize, Serialize};

/// Counts of queue entries by state, as carried by `queue_update`.
///
/// A `queue_update` replaces the previous status wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub processing: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,

    /// Total reported by the backend. When absent, [`QueueStatus::total`]
    /// falls back to the sum of the state counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// Most recent queue entries, newest first.
    #[serde(default, alias = "recentActivity")]
    pub recent_activity: Vec<QueueActivity>,
}

impl QueueStatus {
    /// Total number of queue entries. The fallback sum saturates at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or_else(|| {
            self.pending
                .saturating_add(self.processing)
                .saturating_add(self.completed)
                .saturating_add(self.failed)
        })
    }

    /// Fraction of entries that failed, 0.0 when the queue is empty.
    pub fn failure_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.failed as f64 / total as f64
        }
    }
}

/// One queue entry as shown in the recent activity feed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueActivity {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, alias = "sourceType", skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A queue processing failure pushed as `queue_error`.
///
/// These are not alerts on the wire; the console turns them into one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueueError {
    #[serde(default, alias = "message")]
    pub error: String,
    #[serde(default, alias = "errorType", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, alias = "queueId", skip_serializing_if = "Option::is_none")]
    pub queue_id: Option<String>,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, alias = "sourceType", skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_prefers_explicit_value() {
        let status = QueueStatus {
            failed: 40,
            total: Some(100),
            ..Default::default()
        };
        assert_eq!(status.total(), 100);
        assert!((status.failure_ratio() - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_falls_back_to_sum() {
        let status: QueueStatus =
            serde_json::from_str(r#"{"pending":1,"processing":2,"completed":3,"failed":4}"#)
                .unwrap();
        assert_eq!(status.total(), 10);
    }

    #[test]
    fn test_total_saturates_on_huge_counts() {
        let status: QueueStatus =
            serde_json::from_str(r#"{"pending":18446744073709551615,"failed":1}"#).unwrap();
        assert_eq!(status.total(), u64::MAX);
        assert!(status.failure_ratio() < 0.01);
    }

    #[test]
    fn test_empty_queue_ratio_is_zero() {
        assert_eq!(QueueStatus::default().failure_ratio(), 0.0);
    }

    #[test]
    fn test_queue_error_accepts_camel_case() {
        let err: QueueError = serde_json::from_str(
            r#"{"message":"rate limited","errorType":"rate_limit","userId":"u1","sourceType":"reddit"}"#,
        )
        .unwrap();
        assert_eq!(err.error, "rate limited");
        assert_eq!(err.error_type.as_deref(), Some("rate_limit"));
        assert_eq!(err.source_type.as_deref(), Some("reddit"));
    }
}
