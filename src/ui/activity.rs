//! Activity view: user stats, user activity, recovery actions and email delivery.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{block, format_count, render_empty, short_time};
use crate::app::App;

/// Render the Activity view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(6)]).split(area);
    render_stats(frame, app, rows[0]);

    let columns =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[1]);
    render_users(frame, app, columns[0]);

    let right = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);
    render_recovery(frame, app, right[0]);
    render_email(frame, app, right[1]);
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let google = if app.prefs.google_alerts_enabled {
        Span::styled("on", Style::default().fg(app.theme.healthy))
    } else {
        Span::styled("off", Style::default().add_modifier(Modifier::DIM))
    };

    let mut spans = match &app.user_stats {
        Some(s) => vec![Span::raw(format!(
            " {} users ({} active, {} new today) │ {} mentions ({} today)",
            format_count(s.total_users),
            format_count(s.active_users),
            format_count(s.new_users_today),
            format_count(s.total_mentions),
            format_count(s.mentions_today),
        ))],
        None => vec![Span::styled(
            " User stats not loaded (r:refresh)",
            Style::default().add_modifier(Modifier::DIM),
        )],
    };
    spans.push(Span::raw(" │ Google Alerts "));
    spans.push(google);

    let paragraph = Paragraph::new(Line::from(spans)).block(block(app, " Users ".to_string()));
    frame.render_widget(paragraph, area);
}

fn render_users(frame: &mut Frame, app: &App, area: Rect) {
    let activity = &app.snapshot().user_activity;
    if activity.is_empty() {
        render_empty(frame, app, area, " User Activity (0) ".to_string(), "No user activity yet");
        return;
    }

    let header = Row::new(vec!["Time", "User", "Action", "Detail"])
        .height(1)
        .style(app.theme.header);
    let rows: Vec<Row> = activity
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(short_time(&a.timestamp)),
                Cell::from(a.user_id.clone()),
                Cell::from(a.action.clone()),
                Cell::from(a.detail.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Fill(2),
        ],
    )
    .header(header)
    .block(block(app, format!(" User Activity ({}) ", activity.len())))
    .row_highlight_style(app.theme.selected)
    .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_recovery(frame: &mut Frame, app: &App, area: Rect) {
    let actions = &app.snapshot().recovery_actions;
    if actions.is_empty() {
        render_empty(frame, app, area, " Recovery (0) ".to_string(), "No recovery actions");
        return;
    }

    let rows: Vec<Row> = actions
        .iter()
        .map(|a| {
            let style = match a.status.as_str() {
                "failed" => Style::default().fg(app.theme.critical),
                "success" | "completed" => Style::default().fg(app.theme.healthy),
                _ => Style::default(),
            };
            Row::new(vec![
                Cell::from(short_time(&a.timestamp)),
                Cell::from(a.action.clone()),
                Cell::from(a.target.clone().unwrap_or_default()),
                Cell::from(a.status.clone()).style(style),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(10),
        ],
    )
    .block(block(app, format!(" Recovery ({}) ", actions.len())));
    frame.render_widget(table, area);
}

fn render_email(frame: &mut Frame, app: &App, area: Rect) {
    let deliveries = &app.snapshot().email_delivery;
    if deliveries.is_empty() {
        render_empty(frame, app, area, " Email (0) ".to_string(), "No email deliveries");
        return;
    }

    let failures = deliveries.iter().filter(|d| d.is_failure()).count();
    let rows: Vec<Row> = deliveries
        .iter()
        .map(|d| {
            let style = if d.is_failure() {
                Style::default().fg(app.theme.critical)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(short_time(&d.timestamp)),
                Cell::from(d.recipient.clone()),
                Cell::from(d.status.clone()).style(style),
                Cell::from(d.error.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Fill(2),
            Constraint::Length(10),
            Constraint::Fill(1),
        ],
    )
    .block(block(
        app,
        format!(" Email ({}, {} failed) ", deliveries.len(), failures),
    ));
    frame.render_widget(table, area);
}
