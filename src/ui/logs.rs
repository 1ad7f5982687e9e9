//! Logs view: backend error log entries fetched over REST.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::common::{block, render_empty, short_time};
use crate::app::App;

/// Render the Logs view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let logs = app.filtered_error_logs();

    if logs.is_empty() {
        let message = if app.error_logs.is_empty() {
            "No log entries loaded (r:refresh)"
        } else {
            "No log entries match the filter"
        };
        render_empty(
            frame,
            app,
            area,
            format!(" Error Logs (0/{}) ", app.error_logs.len()),
            message,
        );
        return;
    }

    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(7)]).split(area);

    let header = Row::new(vec!["Time", "Level", "Source", "Message"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = logs
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(short_time(&e.timestamp)),
                Cell::from(e.level.clone()).style(level_style(app, &e.level)),
                Cell::from(e.source.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(e.message.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Fill(1),
    ];

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(
            app,
            format!(
                " Error Logs ({}/{}){} ",
                logs.len(),
                app.error_logs.len(),
                filter_info
            ),
        ))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let selected = app.selected_index.min(logs.len() - 1);
    let mut state = TableState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(table, chunks[0], &mut state);

    let entry = logs[selected];
    let context = if entry.context.is_null() {
        "No context".to_string()
    } else {
        serde_json::to_string_pretty(&entry.context).unwrap_or_else(|_| entry.context.to_string())
    };
    let paragraph = Paragraph::new(context)
        .wrap(Wrap { trim: false })
        .block(block(app, format!(" Context: {} ", entry.id)));
    frame.render_widget(paragraph, chunks[1]);
}

fn level_style(app: &App, level: &str) -> Style {
    match level.to_ascii_lowercase().as_str() {
        "fatal" | "critical" => Style::default()
            .fg(app.theme.critical)
            .add_modifier(Modifier::BOLD),
        "error" => Style::default().fg(app.theme.critical),
        "warn" | "warning" => Style::default().fg(app.theme.warning),
        _ => Style::default().fg(app.theme.info),
    }
}
