//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, prompt line and
//! help overlay, plus small formatting helpers.

use std::time::SystemTime;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::HealthStatus;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the header bar with connection state and backend health.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let connection = app.connection();
    let snapshot = app.snapshot();

    let (icon, label, style) = if connection.connected {
        let transport = connection
            .transport
            .map(|t| t.to_string())
            .unwrap_or_default();
        (
            "●",
            format!("LIVE {}", transport),
            Style::default().fg(app.theme.healthy),
        )
    } else if connection.failed {
        (
            "✕",
            "OFFLINE".to_string(),
            app.theme.status_style(HealthStatus::Critical),
        )
    } else if connection.attempts > 0 {
        (
            "○",
            format!("RECONNECTING ({})", connection.attempts),
            Style::default().fg(app.theme.warning),
        )
    } else {
        (
            "○",
            "CONNECTING".to_string(),
            Style::default().add_modifier(Modifier::DIM),
        )
    };

    let queue = snapshot.queue_health(&app.thresholds);
    let system = snapshot.system_health();

    let mut spans = vec![
        Span::styled(format!(" {} ", icon), style),
        Span::styled("MENTIONWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(label, style),
        Span::raw(" │ queue "),
        Span::styled(queue.symbol(), app.theme.status_style(queue)),
        Span::raw(" system "),
        Span::styled(system.symbol(), app.theme.status_style(system)),
    ];

    if let Some(q) = &snapshot.queue_status {
        spans.push(Span::raw(format!(
            " │ {} pending {} failed",
            format_count(q.pending),
            format_count(q.failed)
        )));
    }

    let alerts = snapshot.alerts.len();
    if alerts > 0 {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} alerts", alerts),
            Style::default().fg(app.theme.warning),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!(" {}:{} ", i + 1, v.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|v| *v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .padding("", "")
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the open prompt, a live toast, or the source, last update age and
/// context-sensitive controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(prompt) = &app.prompt {
        let line = Line::from(vec![
            Span::styled(format!(" {}: ", prompt.kind.label()), app.theme.header),
            Span::raw(format!("{}_", prompt.input)),
            Span::styled(
                "  Enter:submit Esc:cancel",
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(toast) = app.active_toast() {
        let paragraph = Paragraph::new(format!(" {} ", toast.message))
            .style(app.theme.toast_style(toast.kind));
        frame.render_widget(paragraph, area);
        return;
    }

    let connection = app.connection();
    let updated = match connection.last_update {
        Some(at) => format!("Updated {} ago", format_age(at)),
        None => "Waiting for data".to_string(),
    };

    let controls = if app.filter_active {
        "Type to search | Enter:apply Esc:cancel"
    } else {
        match app.current_view {
            View::Alerts => "/:search Enter:detail R:reconnect ?:help q:quit",
            View::Errors => "/:search r:refresh x:reset ?:help q:quit",
            View::Logs => "/:search r:refresh ?:help q:quit",
            View::Health => "r:refresh x:reset R:reconnect ?:help q:quit",
            View::Activity => "r:refresh K:keyword t:source g:google ?:help q:quit",
            View::Queue => "Tab:switch x:reset R:reconnect ?:help q:quit",
        }
    };

    let status = match &connection.last_error {
        Some(err) if !connection.connected => {
            format!(" {} | Error: {} | R:reconnect q:quit", app.source_description(), err)
        }
        _ => format!(" {} | {} | {}", app.source_description(), updated, controls),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  1-6         Jump to view"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Enter       Alert detail"),
        Line::from("  Esc         Go back"),
        Line::from("  /  c        Filter / clear filter"),
        Line::from(""),
        section(" Actions"),
        Line::from("  r         Refresh REST data"),
        Line::from("  R         Reconnect live stream"),
        Line::from("  x         Reset queue"),
        Line::from("  K         Update brand keyword"),
        Line::from("  t         Toggle a user's source"),
        Line::from("  g         Toggle Google Alerts"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 25u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// A bordered block in the theme's style.
pub fn block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

/// Render a titled block with a dimmed placeholder message.
pub fn render_empty(frame: &mut Frame, app: &App, area: Rect, title: String, message: &str) {
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", message),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .block(block(app, title));
    frame.render_widget(paragraph, area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn format_age(at: SystemTime) -> String {
    let elapsed = at.elapsed().unwrap_or_default();
    crate::data::duration::format_duration(std::time::Duration::from_secs(elapsed.as_secs()))
}

/// Render the last `width` sparkline levels as bar characters.
pub fn render_sparkline(data: &[u8], width: usize) -> String {
    if data.is_empty() {
        return " ".repeat(width);
    }
    let skip = data.len().saturating_sub(width);
    data[skip..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}

/// Shorten a timestamp for table cells: ISO strings keep `HH:MM:SS`.
pub fn short_time(timestamp: &str) -> String {
    match timestamp.split_once('T') {
        Some((_, time)) => time.chars().take(8).collect(),
        None => timestamp.to_string(),
    }
}
