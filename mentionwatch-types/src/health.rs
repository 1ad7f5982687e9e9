//! Subsystem and API source health payloads.

use serde::{Deserialize, Serialize};

/// Status reported for a single backend subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsystemStatus {
    Healthy,
    Degraded,
    Unhealthy,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SubsystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsystemStatus::Healthy => "healthy",
            SubsystemStatus::Degraded => "degraded",
            SubsystemStatus::Unhealthy => "unhealthy",
            SubsystemStatus::Unknown => "unknown",
        }
    }
}

/// Health record for one subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubsystemHealth {
    #[serde(default)]
    pub status: SubsystemStatus,
    #[serde(
        default,
        alias = "lastCheck",
        alias = "last_checked",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SubsystemHealth {
    pub fn new(status: SubsystemStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

/// Backend health as pushed by `system_health`. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemHealth {
    #[serde(default)]
    pub database: SubsystemHealth,
    #[serde(default, alias = "apiEndpoints")]
    pub api_endpoints: SubsystemHealth,
    #[serde(default, alias = "queueSystem")]
    pub queue_system: SubsystemHealth,
}

/// Health of one mention source (Reddit, news, Google Alerts...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: String,
    #[serde(default)]
    pub status: SubsystemStatus,
    #[serde(default, alias = "responseTimeMs", skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, alias = "errorRate", skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,
    #[serde(default, alias = "lastCheck", skip_serializing_if = "Option::is_none")]
    pub last_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-source health report, pushed as `api_health` or fetched over REST.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiHealth {
    #[serde(default)]
    pub sources: Vec<SourceHealth>,
}

impl ApiHealth {
    /// Sources whose status is not `healthy`.
    pub fn unhealthy_sources(&self) -> impl Iterator<Item = &SourceHealth> {
        self.sources
            .iter()
            .filter(|s| s.status != SubsystemStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_string() {
        let health: SubsystemHealth =
            serde_json::from_str(r#"{"status":"on fire","lastCheck":"now"}"#).unwrap();
        assert_eq!(health.status, SubsystemStatus::Unknown);
        assert_eq!(health.last_check.as_deref(), Some("now"));
    }

    #[test]
    fn test_system_health_missing_subsystems_default() {
        let health: SystemHealth =
            serde_json::from_str(r#"{"database":{"status":"unhealthy"}}"#).unwrap();
        assert_eq!(health.database.status, SubsystemStatus::Unhealthy);
        assert_eq!(health.queue_system.status, SubsystemStatus::Unknown);
    }

    #[test]
    fn test_unhealthy_sources() {
        let report = ApiHealth {
            sources: vec![
                SourceHealth {
                    source: "reddit".into(),
                    status: SubsystemStatus::Healthy,
                    ..Default::default()
                },
                SourceHealth {
                    source: "news".into(),
                    status: SubsystemStatus::Degraded,
                    ..Default::default()
                },
            ],
        };
        let names: Vec<_> = report.unhealthy_sources().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["news"]);
    }
}
