//! The in-memory realtime snapshot and the reducer that folds messages into it.

use std::time::{SystemTime, UNIX_EPOCH};

use mentionwatch_types::{
    Alert, ApiHealth, EmailDelivery, Envelope, InitialData, Message, QueueError, QueueStatus,
    RecoveryAction, SentimentUpdate, Severity, SystemHealth, UserActivity,
};

use super::capped::CappedList;
use super::health::{self, HealthStatus, Thresholds};

/// Maximum alerts kept in the snapshot.
pub const MAX_ALERTS: usize = 50;
/// Maximum recovery actions kept in the snapshot.
pub const MAX_RECOVERY_ACTIONS: usize = 20;
/// Maximum user activity records kept in the snapshot.
pub const MAX_USER_ACTIVITY: usize = 30;
/// Maximum email delivery records kept in the snapshot.
pub const MAX_EMAIL_DELIVERY: usize = 20;

/// Latest known state per data category, rebuilt from the push stream.
///
/// Whole-value categories are replaced on each update; event categories are
/// capped, newest-first lists.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeSnapshot {
    pub queue_status: Option<QueueStatus>,
    pub system_health: Option<SystemHealth>,
    pub api_health: Option<ApiHealth>,
    pub sentiment: Option<SentimentUpdate>,
    pub alerts: CappedList<Alert>,
    pub recovery_actions: CappedList<RecoveryAction>,
    pub user_activity: CappedList<UserActivity>,
    pub email_delivery: CappedList<EmailDelivery>,
}

impl Default for RealtimeSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeSnapshot {
    pub fn new() -> Self {
        Self {
            queue_status: None,
            system_health: None,
            api_health: None,
            sentiment: None,
            alerts: CappedList::new(MAX_ALERTS),
            recovery_actions: CappedList::new(MAX_RECOVERY_ACTIONS),
            user_activity: CappedList::new(MAX_USER_ACTIVITY),
            email_delivery: CappedList::new(MAX_EMAIL_DELIVERY),
        }
    }

    /// Fold one decoded envelope into the snapshot.
    pub fn apply(&mut self, envelope: Envelope) {
        let Envelope { timestamp, message } = envelope;

        match message {
            Message::InitialData(data) => self.apply_initial(*data),
            Message::QueueUpdate(status) => self.queue_status = Some(status),
            Message::QueueError(err) => {
                let timestamp = timestamp.unwrap_or_else(now_millis);
                self.alerts.push(queue_error_alert(err, timestamp));
            }
            Message::SystemHealth(health) => self.system_health = Some(health),
            Message::ApiHealth(report) => self.api_health = Some(report),
            Message::SystemAlert(alert) => self.alerts.push(alert),
            Message::SentimentUpdate(sentiment) => self.sentiment = Some(sentiment),
            Message::RecoveryAction(action) => self.recovery_actions.push(action),
            Message::UserActivity(activity) => self.user_activity.push(activity),
            Message::EmailDelivery(delivery) => self.email_delivery.push(delivery),
        }
    }

    fn apply_initial(&mut self, data: InitialData) {
        if let Some(status) = data.queue_status {
            self.queue_status = Some(status);
        }
        if let Some(health) = data.system_health {
            self.system_health = Some(health);
        }
        if let Some(report) = data.api_health {
            self.api_health = Some(report);
        }
        if let Some(sentiment) = data.sentiment {
            self.sentiment = Some(sentiment);
        }
        if let Some(alerts) = data.alerts {
            self.alerts.replace(alerts);
        }
        if let Some(actions) = data.recovery_actions {
            self.recovery_actions.replace(actions);
        }
        if let Some(activity) = data.user_activity {
            self.user_activity.replace(activity);
        }
        if let Some(deliveries) = data.email_delivery {
            self.email_delivery.replace(deliveries);
        }
    }

    /// Queue health, healthy until a queue status arrives.
    pub fn queue_health(&self, thresholds: &Thresholds) -> HealthStatus {
        self.queue_status
            .as_ref()
            .map_or(HealthStatus::Healthy, |q| health::queue_health(q, thresholds))
    }

    /// Backend health, healthy until a health report arrives.
    pub fn system_health(&self) -> HealthStatus {
        self.system_health
            .as_ref()
            .map_or(HealthStatus::Healthy, health::system_health)
    }

    /// Worst of queue and backend health.
    pub fn overall_health(&self, thresholds: &Thresholds) -> HealthStatus {
        self.queue_health(thresholds).max(self.system_health())
    }

    /// Number of alerts at or above `severity`.
    pub fn alert_count_at_least(&self, severity: Severity) -> usize {
        self.alerts.iter().filter(|a| a.severity >= severity).count()
    }
}

/// Turn a queue processing failure into an alert record.
///
/// The id is derived from the message timestamp so repeated deliveries of
/// the same failure collapse to the same id.
pub fn queue_error_alert(err: QueueError, timestamp: String) -> Alert {
    let message = if err.error.is_empty() {
        "Queue entry failed".to_string()
    } else {
        err.error.clone()
    };
    let data = serde_json::to_value(&err).unwrap_or(serde_json::Value::Null);

    Alert::new(format!("queue_error_{}", timestamp), "queue_error", Severity::Error)
        .title("Queue processing error")
        .message(message)
        .timestamp(timestamp)
        .data(data)
}

fn now_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentionwatch_types::{SubsystemHealth, SubsystemStatus};

    fn alert_envelope(i: usize) -> Envelope {
        Envelope::new(
            Message::SystemAlert(Alert::new(format!("a{}", i), "test", Severity::Info)),
            Some(i.to_string()),
        )
    }

    #[test]
    fn test_alerts_capped_and_newest_first() {
        let mut snap = RealtimeSnapshot::new();
        for i in 0..120 {
            snap.apply(alert_envelope(i));
            assert!(snap.alerts.len() <= MAX_ALERTS);
        }
        assert_eq!(snap.alerts.len(), MAX_ALERTS);
        let ids: Vec<_> = snap.alerts.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids.first().map(String::as_str), Some("a119"));
        assert_eq!(ids.last().map(String::as_str), Some("a70"));
    }

    #[test]
    fn test_queue_error_becomes_alert() {
        let mut snap = RealtimeSnapshot::new();
        snap.apply(Envelope::new(
            Message::QueueError(QueueError {
                error: "Reddit API rate limited".into(),
                error_type: Some("rate_limit".into()),
                ..Default::default()
            }),
            Some("2024-05-01T10:00:00Z".into()),
        ));

        let alert = snap.alerts.latest().unwrap();
        assert_eq!(alert.id, "queue_error_2024-05-01T10:00:00Z");
        assert_eq!(alert.severity, Severity::Error);
        assert_eq!(alert.kind, "queue_error");
        assert_eq!(alert.message, "Reddit API rate limited");
        assert_eq!(alert.data["error_type"], "rate_limit");
    }

    #[test]
    fn test_queue_error_without_timestamp_uses_receive_time() {
        let mut snap = RealtimeSnapshot::new();
        snap.apply(Envelope::new(Message::QueueError(QueueError::default()), None));
        let alert = snap.alerts.latest().unwrap();
        let suffix = alert.id.strip_prefix("queue_error_").unwrap();
        assert!(suffix.parse::<u128>().is_ok());
        assert_eq!(alert.timestamp, suffix);
    }

    #[test]
    fn test_queue_update_replaces_wholesale() {
        let mut snap = RealtimeSnapshot::new();
        snap.apply(Envelope::new(
            Message::QueueUpdate(QueueStatus {
                pending: 10,
                failed: 40,
                total: Some(100),
                ..Default::default()
            }),
            None,
        ));
        assert_eq!(snap.queue_health(&Thresholds::default()), HealthStatus::Critical);

        snap.apply(Envelope::new(
            Message::QueueUpdate(QueueStatus {
                completed: 95,
                failed: 5,
                ..Default::default()
            }),
            None,
        ));
        let status = snap.queue_status.as_ref().unwrap();
        assert_eq!(status.pending, 0);
        assert_eq!(status.total(), 100);
        assert_eq!(snap.queue_health(&Thresholds::default()), HealthStatus::Healthy);
    }

    #[test]
    fn test_empty_snapshot_is_healthy() {
        let snap = RealtimeSnapshot::new();
        assert_eq!(snap.overall_health(&Thresholds::default()), HealthStatus::Healthy);
    }

    #[test]
    fn test_system_health_feeds_overall() {
        let mut snap = RealtimeSnapshot::new();
        snap.apply(Envelope::new(
            Message::SystemHealth(SystemHealth {
                database: SubsystemHealth::new(SubsystemStatus::Unhealthy),
                ..Default::default()
            }),
            None,
        ));
        assert_eq!(snap.overall_health(&Thresholds::default()), HealthStatus::Critical);
    }

    #[test]
    fn test_capped_event_lists() {
        let mut snap = RealtimeSnapshot::new();
        for i in 0..100 {
            snap.apply(Envelope::new(
                Message::RecoveryAction(RecoveryAction {
                    id: i.to_string(),
                    ..Default::default()
                }),
                None,
            ));
            snap.apply(Envelope::new(
                Message::UserActivity(UserActivity {
                    id: i.to_string(),
                    ..Default::default()
                }),
                None,
            ));
            snap.apply(Envelope::new(
                Message::EmailDelivery(EmailDelivery {
                    id: i.to_string(),
                    ..Default::default()
                }),
                None,
            ));
        }
        assert_eq!(snap.recovery_actions.len(), MAX_RECOVERY_ACTIONS);
        assert_eq!(snap.user_activity.len(), MAX_USER_ACTIVITY);
        assert_eq!(snap.email_delivery.len(), MAX_EMAIL_DELIVERY);
        assert_eq!(snap.user_activity.latest().unwrap().id, "99");
    }

    #[test]
    fn test_initial_data_keeps_absent_categories() {
        let mut snap = RealtimeSnapshot::new();
        snap.apply(alert_envelope(1));
        snap.apply(Envelope::new(
            Message::InitialData(Box::new(InitialData {
                queue_status: Some(QueueStatus::default()),
                user_activity: Some(
                    (0..40)
                        .map(|i| UserActivity {
                            id: i.to_string(),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            })),
            None,
        ));
        assert!(snap.queue_status.is_some());
        assert_eq!(snap.alerts.len(), 1);
        assert_eq!(snap.user_activity.len(), MAX_USER_ACTIVITY);
        assert_eq!(snap.user_activity.latest().unwrap().id, "0");
    }

    #[test]
    fn test_alert_count_by_severity() {
        let mut snap = RealtimeSnapshot::new();
        snap.apply(Envelope::new(
            Message::SystemAlert(Alert::new("1", "x", Severity::Critical)),
            None,
        ));
        snap.apply(Envelope::new(
            Message::SystemAlert(Alert::new("2", "x", Severity::Info)),
            None,
        ));
        assert_eq!(snap.alert_count_at_least(Severity::Error), 1);
        assert_eq!(snap.alert_count_at_least(Severity::Info), 2);
    }
}
