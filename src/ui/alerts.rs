//! Alerts view: the capped alert feed, newest first.

use mentionwatch_types::Severity;
use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table, TableState},
    Frame,
};

use super::common::{block, render_empty, short_time};
use crate::app::App;

/// Render the Alerts view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = app.filtered_alerts();
    let total = app.snapshot().alerts.len();

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    if alerts.is_empty() {
        let message = if total == 0 {
            "No alerts. All quiet."
        } else {
            "No alerts match the filter"
        };
        render_empty(
            frame,
            app,
            area,
            format!(" Alerts (0/{}){} ", total, filter_info),
            message,
        );
        return;
    }

    let errors = app.snapshot().alert_count_at_least(Severity::Error);

    let header = Row::new(vec!["Time", "Severity", "Type", "Title", "Message"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = alerts
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(short_time(&a.timestamp)),
                Cell::from(a.severity.as_str()).style(app.theme.severity_style(a.severity)),
                Cell::from(a.kind.clone()),
                Cell::from(a.title.clone()),
                Cell::from(a.message.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(16),
        Constraint::Fill(2),
        Constraint::Fill(3),
    ];

    let selected = app.selected_index.min(alerts.len().saturating_sub(1));
    let title = format!(
        " Alerts ({}/{}, {} error+){} [{}/{}] ",
        alerts.len(),
        total,
        errors,
        filter_info,
        selected + 1,
        alerts.len()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(app, title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(table, area, &mut state);
}
