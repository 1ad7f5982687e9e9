//! Data model for the realtime console.
//!
//! ## Submodules
//!
//! - [`capped`]: Newest-first list with a fixed capacity
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "500ms")
//! - [`health`]: Queue and backend health predicates ([`HealthStatus`], [`Thresholds`])
//! - [`history`]: Rolling queue counts for sparklines and rates
//! - [`snapshot`]: The [`RealtimeSnapshot`] and its message reducer
//!
//! ## Data Flow
//!
//! ```text
//! Envelope (decoded push message)
//!        │
//!        ▼
//! RealtimeSnapshot::apply()
//!        │
//!        ├──▶ whole-value categories replaced (queue, health, sentiment)
//!        ├──▶ capped lists pushed (alerts, recovery, activity, email)
//!        │
//!        └──▶ History::record() (console side, on queue changes)
//! ```

pub mod capped;
pub mod duration;
pub mod health;
pub mod history;
pub mod snapshot;

pub use capped::CappedList;
pub use health::{queue_health, subsystem_health, system_health, HealthStatus, Thresholds};
pub use history::{History, QueueSeries};
pub use snapshot::{queue_error_alert, RealtimeSnapshot};
