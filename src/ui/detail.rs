//! Detail overlay rendering.
//!
//! Displays a modal overlay with the full content of the selected alert,
//! including its structured payload.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 40;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 12;

/// Render the alert detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(alert) = app.selected_alert() else {
        return;
    };

    // Width: 80% of screen, clamped to [MIN_OVERLAY_WIDTH, 100]
    let overlay_width = (area.width * 80 / 100).clamp(MIN_OVERLAY_WIDTH, 100);
    // Height: 70% of screen, clamped to [MIN_OVERLAY_HEIGHT, 30]
    let overlay_height = (area.height * 70 / 100).clamp(MIN_OVERLAY_HEIGHT, 30);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(6), // Alert header
        Constraint::Min(3),    // Payload
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    let severity_style = app.theme.severity_style(alert.severity);
    let title = if alert.title.is_empty() {
        alert.kind.as_str()
    } else {
        alert.title.as_str()
    };

    let header_lines = vec![
        Line::from(vec![Span::styled(
            format!(" {} ", title),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(vec![
            Span::raw(" Severity: "),
            Span::styled(alert.severity.as_str(), severity_style.add_modifier(Modifier::BOLD)),
            Span::raw("    Type: "),
            Span::raw(alert.kind.clone()),
            Span::raw("    At: "),
            Span::raw(alert.timestamp.clone()),
        ]),
        Line::from(format!(" Id: {}", alert.id)),
        Line::from(format!(" {}", alert.message)),
    ];

    let header = Paragraph::new(header_lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Alert Detail ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.highlight)),
    );
    frame.render_widget(header, chunks[0]);

    let payload = if alert.data.is_null() {
        "(no payload)".to_string()
    } else {
        serde_json::to_string_pretty(&alert.data).unwrap_or_else(|_| alert.data.to_string())
    };
    let body = Paragraph::new(payload).block(
        Block::default()
            .title(" Data ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(body, chunks[1]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " ↑/↓:previous/next alert  Esc:close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}
