//! Application state and navigation logic.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use mentionwatch_types::{Alert, ApiHealth, ErrorLogEntry, QueueErrorEntry, UserStats};
use tokio::sync::watch;
use tracing::warn;

use crate::actions::{Action, Outcome};
use crate::client::{ClientState, ConnectionStatus};
use crate::data::{History, RealtimeSnapshot, Thresholds};
use crate::prefs::Preferences;
use crate::ui::Theme;

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
///
/// Alert detail is shown as an overlay (controlled by `App::show_detail_overlay`)
/// rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Queue counts, trends and recent queue activity.
    Queue,
    /// Backend subsystems and per-source API health.
    Health,
    /// Alert feed, newest first.
    Alerts,
    /// Recovery actions, user activity and email delivery.
    Activity,
    /// Failed queue items fetched over REST, with remediation hints.
    Errors,
    /// Backend error log fetched over REST.
    Logs,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Queue,
        View::Health,
        View::Alerts,
        View::Activity,
        View::Errors,
        View::Logs,
    ];

    fn index(self) -> usize {
        match self {
            View::Queue => 0,
            View::Health => 1,
            View::Alerts => 2,
            View::Activity => 3,
            View::Errors => 4,
            View::Logs => 5,
        }
    }

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Queue => "Queue",
            View::Health => "Health",
            View::Alerts => "Alerts",
            View::Activity => "Activity",
            View::Errors => "Errors",
            View::Logs => "Logs",
        }
    }

    /// Whether `/` filtering applies to this view.
    pub fn filterable(&self) -> bool {
        matches!(self, View::Alerts | View::Errors | View::Logs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// Temporary feedback shown in the status bar.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

/// Which form the prompt line is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// `<user_id> <keyword>`
    Keyword,
    /// `<user_id> <source> on|off`
    SourceToggle,
    /// Empty for all queues, or `<user_id> [source]`
    ResetQueue,
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Keyword => "keyword <user_id> <keyword>",
            PromptKind::SourceToggle => "source <user_id> <source> on|off",
            PromptKind::ResetQueue => "reset [user_id] [source]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// Work the UI asks the runtime side to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Api(Action),
    Reconnect,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Realtime data
    updates: Option<watch::Receiver<ClientState>>,
    pub state: ClientState,
    pub history: History,
    pub thresholds: Thresholds,
    source_description: String,

    // REST data
    pub queue_errors: Vec<QueueErrorEntry>,
    pub error_logs: Vec<ErrorLogEntry>,
    pub user_stats: Option<UserStats>,
    /// Last `api_health` fetched over REST; cleared when a pushed report arrives.
    fetched_api_health: Option<ApiHealth>,

    // Navigation state
    pub selected_index: usize,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // Form input
    pub prompt: Option<Prompt>,

    // Local preferences
    pub prefs: Preferences,
    prefs_path: Option<PathBuf>,

    // UI
    pub theme: Theme,
    pub toast: Option<Toast>,

    requests: Vec<Request>,
}

impl App {
    /// Create a new App with the given source description and thresholds.
    pub fn new(source_description: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            running: true,
            current_view: View::Queue,
            show_help: false,
            show_detail_overlay: false,
            updates: None,
            state: ClientState::default(),
            history: History::new(),
            thresholds,
            source_description: source_description.into(),
            queue_errors: Vec::new(),
            error_logs: Vec::new(),
            user_stats: None,
            fetched_api_health: None,
            selected_index: 0,
            filter_text: String::new(),
            filter_active: false,
            prompt: None,
            prefs: Preferences::default(),
            prefs_path: None,
            theme: Theme::dark(),
            toast: None,
            requests: Vec::new(),
        }
    }

    /// Follow the state published by a running sync client.
    pub fn with_updates(mut self, updates: watch::Receiver<ClientState>) -> Self {
        self.state = updates.borrow().clone();
        self.updates = Some(updates);
        self
    }

    /// Use these preferences, persisting changes to `path`.
    pub fn with_prefs(mut self, prefs: Preferences, path: PathBuf) -> Self {
        self.prefs = prefs;
        self.prefs_path = Some(path);
        self
    }

    /// Returns a description of the realtime source.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    pub fn snapshot(&self) -> &RealtimeSnapshot {
        &self.state.snapshot
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.state.connection
    }

    /// The most recent API source report, fetched or pushed.
    pub fn api_health(&self) -> Option<&ApiHealth> {
        self.fetched_api_health
            .as_ref()
            .or(self.state.snapshot.api_health.as_ref())
    }

    /// Pull the latest client state. Returns true if anything changed.
    pub fn refresh(&mut self) -> bool {
        let Some(updates) = self.updates.as_mut() else {
            return false;
        };
        if !updates.has_changed().unwrap_or(false) {
            return false;
        }
        let state = updates.borrow_and_update().clone();
        self.set_state(state);
        true
    }

    /// Replace the displayed state, recording queue history on change.
    pub fn set_state(&mut self, state: ClientState) {
        if let Some(queue) = &state.snapshot.queue_status {
            if state.snapshot.queue_status != self.state.snapshot.queue_status {
                self.history.record(queue, Instant::now());
            }
        }
        if state.snapshot.api_health.is_some()
            && state.snapshot.api_health != self.state.snapshot.api_health
        {
            self.fetched_api_health = None;
        }
        self.state = state;
        self.clamp_selection();
    }

    /// Apply the result of an admin action.
    pub fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Done(message) => self.show_toast(message, ToastKind::Success),
            Outcome::Failed(message) => self.show_toast(message, ToastKind::Error),
            Outcome::QueueErrors(entries) => {
                let count = entries.len();
                self.queue_errors = entries;
                self.clamp_selection();
                self.show_toast(format!("Loaded {} queue errors", count), ToastKind::Info);
            }
            Outcome::ErrorLogs(entries) => {
                let count = entries.len();
                self.error_logs = entries;
                self.clamp_selection();
                self.show_toast(format!("Loaded {} log entries", count), ToastKind::Info);
            }
            Outcome::ApiHealth(report) => {
                self.fetched_api_health = Some(report);
                self.clamp_selection();
                self.show_toast("API health refreshed".to_string(), ToastKind::Info);
            }
            Outcome::UserStats(stats) => {
                self.user_stats = Some(stats);
                self.show_toast("User stats refreshed".to_string(), ToastKind::Info);
            }
        }
    }

    /// Drain requests queued by key handling.
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    pub fn request(&mut self, request: Request) {
        self.requests.push(request);
    }

    /// Ask the sync client to reset its attempt counter and reconnect.
    pub fn reconnect(&mut self) {
        self.request(Request::Reconnect);
        self.show_toast("Reconnecting...".to_string(), ToastKind::Info);
    }

    /// Refresh the REST-backed data for the current view.
    pub fn refresh_view(&mut self) {
        match self.current_view {
            View::Errors => self.request(Request::Api(Action::RefreshErrors)),
            View::Logs => self.request(Request::Api(Action::RefreshErrorLogs)),
            View::Health => self.request(Request::Api(Action::RefreshApiHealth)),
            View::Activity => self.request(Request::Api(Action::RefreshUserStats)),
            View::Queue | View::Alerts => {
                self.request(Request::Api(Action::RefreshErrors));
                self.request(Request::Api(Action::RefreshUserStats));
            }
        }
    }

    /// Flip the Google Alerts preference and persist it.
    pub fn toggle_google_alerts(&mut self) {
        let enabled = self.prefs.toggle_google_alerts();
        if let Some(path) = &self.prefs_path {
            if let Err(e) = self.prefs.save(path) {
                warn!(error = %e, path = %path.display(), "failed to save preferences");
                self.show_toast(format!("Failed to save preferences: {}", e), ToastKind::Error);
                return;
            }
        }
        let state = if enabled { "enabled" } else { "disabled" };
        self.show_toast(format!("Google Alerts {}", state), ToastKind::Success);
    }

    /// Show a toast that expires after [`TOAST_DURATION`].
    pub fn show_toast(&mut self, message: String, kind: ToastKind) {
        self.toast = Some(Toast {
            message,
            kind,
            shown_at: Instant::now(),
        });
    }

    /// The current toast if it hasn't expired.
    pub fn active_toast(&self) -> Option<&Toast> {
        self.toast
            .as_ref()
            .filter(|t| t.shown_at.elapsed() < TOAST_DURATION)
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_index = 0;
        self.show_detail_overlay = false;
    }

    /// Number of selectable rows in the current view.
    pub fn item_count(&self) -> usize {
        let snapshot = &self.state.snapshot;
        match self.current_view {
            View::Queue => snapshot
                .queue_status
                .as_ref()
                .map_or(0, |q| q.recent_activity.len()),
            View::Health => self.api_health().map_or(0, |h| h.sources.len()),
            View::Alerts => self.filtered_alerts().len(),
            View::Activity => snapshot.user_activity.len(),
            View::Errors => self.filtered_queue_errors().len(),
            View::Logs => self.filtered_error_logs().len(),
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.item_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        self.selected_index = self.item_count().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let max = self.item_count().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Alerts matching the filter, newest first.
    pub fn filtered_alerts(&self) -> Vec<&Alert> {
        self.state
            .snapshot
            .alerts
            .iter()
            .filter(|a| {
                self.matches_filter(&a.title)
                    || self.matches_filter(&a.message)
                    || self.matches_filter(&a.kind)
            })
            .collect()
    }

    /// Queue errors matching the filter.
    pub fn filtered_queue_errors(&self) -> Vec<&QueueErrorEntry> {
        self.queue_errors
            .iter()
            .filter(|e| {
                self.matches_filter(&e.source_type)
                    || self.matches_filter(&e.user_id)
                    || self.matches_filter(&e.error_message)
            })
            .collect()
    }

    /// Log entries matching the filter.
    pub fn filtered_error_logs(&self) -> Vec<&ErrorLogEntry> {
        self.error_logs
            .iter()
            .filter(|e| {
                self.matches_filter(&e.message)
                    || self.matches_filter(&e.level)
                    || e.source.as_deref().is_some_and(|s| self.matches_filter(s))
            })
            .collect()
    }

    /// The alert under the cursor in the Alerts view.
    pub fn selected_alert(&self) -> Option<&Alert> {
        self.filtered_alerts().get(self.selected_index).copied()
    }

    pub fn selected_queue_error(&self) -> Option<&QueueErrorEntry> {
        self.filtered_queue_errors().get(self.selected_index).copied()
    }

    /// Open the detail overlay for the selected alert.
    pub fn enter_detail(&mut self) {
        if self.current_view == View::Alerts && self.selected_alert().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlay first, then return to the Queue view.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if self.current_view != View::Queue {
            self.set_view(View::Queue);
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        if self.current_view.filterable() {
            self.filter_active = true;
        }
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.clamp_selection();
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_index = 0;
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a field matches the current filter.
    pub fn matches_filter(&self, text: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        text.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Open the prompt line for a form.
    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt = Some(Prompt {
            kind,
            input: String::new(),
        });
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    pub fn prompt_push(&mut self, c: char) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.push(c);
        }
    }

    pub fn prompt_pop(&mut self) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.input.pop();
        }
    }

    /// Parse the prompt input and queue the matching action.
    ///
    /// Invalid input keeps the prompt open and shows the problem as a toast.
    pub fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.as_ref() else {
            return;
        };
        let parsed = match prompt.kind {
            PromptKind::Keyword => Action::parse_keyword(&prompt.input),
            PromptKind::SourceToggle => Action::parse_source_toggle(&prompt.input),
            PromptKind::ResetQueue => Ok(Action::parse_reset(&prompt.input)),
        };
        match parsed {
            Ok(action) => {
                self.prompt = None;
                self.request(Request::Api(action));
            }
            Err(message) => self.show_toast(message, ToastKind::Error),
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentionwatch_types::{Envelope, Severity};
    use tempfile::TempDir;

    fn app() -> App {
        App::new("test", Thresholds::default())
    }

    fn apply(app: &mut App, frame: &str) {
        let mut state = app.state.clone();
        state.snapshot.apply(Envelope::parse(frame).unwrap());
        app.set_state(state);
    }

    fn alert(id: &str, title: &str) -> String {
        format!(
            r#"{{"type":"system_alert","data":{{"id":"{}","type":"test","title":"{}","message":"","severity":"warning","timestamp":"1"}}}}"#,
            id, title
        )
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Queue.next(), View::Health);
        assert_eq!(View::Errors.next(), View::Logs);
        assert_eq!(View::Logs.next(), View::Queue);
        assert_eq!(View::Queue.prev(), View::Logs);
        for view in View::ALL {
            assert_eq!(view.next().prev(), view);
        }
    }

    #[test]
    fn test_history_records_queue_changes_only() {
        let mut app = app();
        apply(&mut app, r#"{"type":"queue_update","data":{"pending":1}}"#);
        apply(&mut app, r#"{"type":"system_health","data":{}}"#);
        apply(&mut app, r#"{"type":"queue_update","data":{"pending":2}}"#);
        assert_eq!(app.history.len(), 2);
    }

    #[test]
    fn test_refresh_from_watch() {
        let (tx, rx) = watch::channel(ClientState::default());
        let mut app = app().with_updates(rx);
        assert!(!app.refresh());

        tx.send_modify(|s| s.connection.connected = true);
        assert!(app.refresh());
        assert!(app.connection().connected);
        assert!(!app.refresh());
    }

    #[test]
    fn test_alert_filter_and_detail() {
        let mut app = app();
        apply(&mut app, &alert("a1", "Database slow"));
        apply(&mut app, &alert("a2", "Quota low"));
        app.set_view(View::Alerts);

        assert_eq!(app.item_count(), 2);
        assert_eq!(app.selected_alert().unwrap().id, "a2");

        app.start_filter();
        for c in "database".chars() {
            app.filter_push(c);
        }
        assert_eq!(app.item_count(), 1);
        assert_eq!(app.selected_alert().unwrap().id, "a1");
        assert_eq!(app.selected_alert().unwrap().severity, Severity::Warning);

        app.enter_detail();
        assert!(app.show_detail_overlay);
        app.go_back();
        assert!(!app.show_detail_overlay);
        assert_eq!(app.current_view, View::Alerts);
        app.go_back();
        assert_eq!(app.current_view, View::Queue);
    }

    #[test]
    fn test_filter_only_on_filterable_views() {
        let mut app = app();
        app.start_filter();
        assert!(!app.filter_active);
        app.set_view(View::Errors);
        app.start_filter();
        assert!(app.filter_active);
    }

    #[test]
    fn test_selection_clamped() {
        let mut app = app();
        app.set_view(View::Alerts);
        app.select_next_n(10);
        assert_eq!(app.selected_index, 0);

        for i in 0..5 {
            apply(&mut app, &alert(&format!("a{}", i), "x"));
        }
        app.select_last();
        assert_eq!(app.selected_index, 4);
        app.select_prev_n(10);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_submit_prompt() {
        let mut app = app();
        app.open_prompt(PromptKind::SourceToggle);
        for c in "u1 reddit".chars() {
            app.prompt_push(c);
        }
        app.submit_prompt();
        assert!(app.prompt.is_some());
        assert_eq!(app.active_toast().unwrap().kind, ToastKind::Error);
        assert!(app.take_requests().is_empty());

        for c in " on".chars() {
            app.prompt_push(c);
        }
        app.submit_prompt();
        assert!(app.prompt.is_none());
        assert!(matches!(
            app.take_requests().as_slice(),
            [Request::Api(Action::ToggleSource(_))]
        ));
    }

    #[test]
    fn test_outcome_toasts() {
        let mut app = app();
        app.apply_outcome(Outcome::Failed("Failed to reset queue: boom".into()));
        let toast = app.active_toast().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("boom"));

        app.apply_outcome(Outcome::QueueErrors(vec![QueueErrorEntry::default()]));
        assert_eq!(app.queue_errors.len(), 1);
    }

    #[test]
    fn test_toast_expires() {
        let mut app = app();
        app.show_toast("hi".into(), ToastKind::Info);
        assert!(app.active_toast().is_some());
        app.toast.as_mut().unwrap().shown_at = Instant::now() - TOAST_DURATION;
        assert!(app.active_toast().is_none());
    }

    #[test]
    fn test_google_alerts_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        let mut app = app().with_prefs(Preferences::default(), path.clone());

        app.toggle_google_alerts();
        assert!(app.prefs.google_alerts_enabled);
        assert!(Preferences::load(&path).unwrap().google_alerts_enabled);
    }

    #[test]
    fn test_reconnect_and_refresh_requests() {
        let mut app = app();
        app.reconnect();
        app.set_view(View::Errors);
        app.refresh_view();
        assert_eq!(
            app.take_requests(),
            vec![Request::Reconnect, Request::Api(Action::RefreshErrors)]
        );

        app.set_view(View::Logs);
        app.refresh_view();
        app.set_view(View::Health);
        app.refresh_view();
        assert_eq!(
            app.take_requests(),
            vec![
                Request::Api(Action::RefreshErrorLogs),
                Request::Api(Action::RefreshApiHealth),
            ]
        );
    }

    #[test]
    fn test_error_logs_loaded_and_filtered() {
        let mut app = app();
        app.set_view(View::Logs);
        app.apply_outcome(Outcome::ErrorLogs(vec![
            ErrorLogEntry {
                id: "l1".into(),
                level: "error".into(),
                message: "scraper crashed".into(),
                source: Some("reddit".into()),
                ..Default::default()
            },
            ErrorLogEntry {
                id: "l2".into(),
                level: "warn".into(),
                message: "slow response".into(),
                source: None,
                ..Default::default()
            },
        ]));
        assert_eq!(app.item_count(), 2);

        app.start_filter();
        assert!(app.filter_active);
        for c in "reddit".chars() {
            app.filter_push(c);
        }
        let logs = app.filtered_error_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, "l1");
    }

    #[test]
    fn test_latest_api_health_wins() {
        let mut app = app();
        apply(
            &mut app,
            r#"{"type":"api_health","data":{"sources":[{"source":"reddit","status":"healthy"}]}}"#,
        );
        assert_eq!(app.api_health().unwrap().sources[0].source, "reddit");

        app.apply_outcome(Outcome::ApiHealth(ApiHealth {
            sources: vec![Default::default(), Default::default()],
        }));
        app.set_view(View::Health);
        assert_eq!(app.item_count(), 2);

        // Unrelated push keeps the fetched report
        apply(&mut app, r#"{"type":"queue_update","data":{"pending":1}}"#);
        assert_eq!(app.item_count(), 2);

        // A newer pushed report replaces it
        apply(
            &mut app,
            r#"{"type":"api_health","data":{"sources":[{"source":"news","status":"degraded"}]}}"#,
        );
        assert_eq!(app.api_health().unwrap().sources[0].source, "news");
    }
}
