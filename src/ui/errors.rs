//! Errors view: failed queue items with remediation hints for the selected one.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::common::{block, render_empty, short_time};
use crate::api::guidance_for;
use crate::app::App;

/// Render the Errors view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let errors = app.filtered_queue_errors();

    if errors.is_empty() {
        let message = if app.queue_errors.is_empty() {
            "No queue errors loaded (r:refresh)"
        } else {
            "No errors match the filter"
        };
        render_empty(
            frame,
            app,
            area,
            format!(" Queue Errors (0/{}) ", app.queue_errors.len()),
            message,
        );
        return;
    }

    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(6)]).split(area);

    let header = Row::new(vec!["Created", "User", "Source", "Type", "Retries", "Message"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = errors
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(short_time(&e.created_at)),
                Cell::from(e.user_id.clone()),
                Cell::from(e.source_type.clone()),
                Cell::from(e.error_type.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(e.retry_count.to_string()),
                Cell::from(e.error_message.clone())
                    .style(Style::default().fg(app.theme.critical)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(7),
        Constraint::Fill(3),
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
                " Queue Errors ({}/{}){} ",
                errors.len(),
                app.queue_errors.len(),
                filter_info
            ),
        ))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(errors.len() - 1)));
    frame.render_stateful_widget(table, chunks[0], &mut state);

    if let Some(selected) = app.selected_queue_error() {
        let guidance = guidance_for(selected.error_type.as_deref());
        let mut lines = vec![Line::from(Span::styled(
            format!(" {}", guidance.title),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.extend(guidance.hints.iter().map(|h| Line::from(format!("  • {}", h))));

        let hints = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block(app, " Guidance ".to_string()));
        frame.render_widget(hints, chunks[1]);
    }
}
