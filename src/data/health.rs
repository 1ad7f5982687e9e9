//! Derived health predicates over queue and subsystem state.
//!
//! Both predicates are pure functions; the snapshot exposes convenience
//! wrappers that default to healthy before any data has arrived.

use mentionwatch_types::{QueueStatus, SubsystemStatus, SystemHealth};

/// Thresholds for queue health computation.
///
/// A queue is in warning when its failed-to-total ratio exceeds
/// `failure_warning`, critical when it exceeds `failure_critical`.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub failure_warning: f64,
    pub failure_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            failure_warning: 0.10,
            failure_critical: 0.30,
        }
    }
}

/// Health status for the queue, the backend, or a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum HealthStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        }
    }
}

/// Queue health from the failed-to-total ratio. An empty queue is healthy.
pub fn queue_health(status: &QueueStatus, thresholds: &Thresholds) -> HealthStatus {
    let ratio = status.failure_ratio();
    if ratio > thresholds.failure_critical {
        HealthStatus::Critical
    } else if ratio > thresholds.failure_warning {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

/// Backend health: the database and API endpoints are critical dependencies,
/// the queue subsystem only degrades the console to a warning.
pub fn system_health(health: &SystemHealth) -> HealthStatus {
    if health.database.status == SubsystemStatus::Unhealthy
        || health.api_endpoints.status == SubsystemStatus::Unhealthy
    {
        HealthStatus::Critical
    } else if matches!(
        health.queue_system.status,
        SubsystemStatus::Unhealthy | SubsystemStatus::Degraded
    ) {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

/// Map a single subsystem or source status onto the console's scale.
pub fn subsystem_health(status: SubsystemStatus) -> HealthStatus {
    match status {
        SubsystemStatus::Healthy | SubsystemStatus::Unknown => HealthStatus::Healthy,
        SubsystemStatus::Degraded => HealthStatus::Warning,
        SubsystemStatus::Unhealthy => HealthStatus::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentionwatch_types::SubsystemHealth;

    fn queue(failed: u64, total: u64) -> QueueStatus {
        QueueStatus {
            failed,
            total: Some(total),
            ..Default::default()
        }
    }

    #[test]
    fn test_queue_health_bands() {
        let t = Thresholds::default();
        assert_eq!(queue_health(&queue(40, 100), &t), HealthStatus::Critical);
        assert_eq!(queue_health(&queue(15, 100), &t), HealthStatus::Warning);
        assert_eq!(queue_health(&queue(5, 100), &t), HealthStatus::Healthy);
        assert_eq!(queue_health(&queue(0, 0), &t), HealthStatus::Healthy);
    }

    #[test]
    fn test_queue_health_boundaries_are_exclusive() {
        let t = Thresholds::default();
        assert_eq!(queue_health(&queue(30, 100), &t), HealthStatus::Warning);
        assert_eq!(queue_health(&queue(10, 100), &t), HealthStatus::Healthy);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            failure_warning: 0.01,
            failure_critical: 0.05,
        };
        assert_eq!(queue_health(&queue(6, 100), &t), HealthStatus::Critical);
        assert_eq!(queue_health(&queue(2, 100), &t), HealthStatus::Warning);
    }

    #[test]
    fn test_database_unhealthy_alone_is_critical() {
        let health = SystemHealth {
            database: SubsystemHealth::new(SubsystemStatus::Unhealthy),
            api_endpoints: SubsystemHealth::new(SubsystemStatus::Healthy),
            queue_system: SubsystemHealth::new(SubsystemStatus::Healthy),
        };
        assert_eq!(system_health(&health), HealthStatus::Critical);
    }

    #[test]
    fn test_api_endpoints_unhealthy_is_critical() {
        let health = SystemHealth {
            api_endpoints: SubsystemHealth::new(SubsystemStatus::Unhealthy),
            queue_system: SubsystemHealth::new(SubsystemStatus::Degraded),
            ..Default::default()
        };
        assert_eq!(system_health(&health), HealthStatus::Critical);
    }

    #[test]
    fn test_degraded_queue_is_warning() {
        let health = SystemHealth {
            queue_system: SubsystemHealth::new(SubsystemStatus::Degraded),
            ..Default::default()
        };
        assert_eq!(system_health(&health), HealthStatus::Warning);
    }

    #[test]
    fn test_degraded_database_is_not_critical() {
        let health = SystemHealth {
            database: SubsystemHealth::new(SubsystemStatus::Degraded),
            ..Default::default()
        };
        assert_eq!(system_health(&health), HealthStatus::Healthy);
    }
}
