//! Health view: backend subsystems and per-source API health.

use mentionwatch_types::{SubsystemHealth, SubsystemStatus};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{block, render_empty, short_time};
use crate::app::App;
use crate::data::subsystem_health;

/// Render the Health view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(5), Constraint::Min(4)]).split(area);
    render_system(frame, app, chunks[0]);
    render_sources(frame, app, chunks[1]);
}

fn render_system(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.snapshot();
    let Some(system) = &snapshot.system_health else {
        render_empty(frame, app, area, " System ".to_string(), "No health report yet");
        return;
    };

    let overall = snapshot.system_health();
    let line = |name: &'static str, sub: &SubsystemHealth| {
        let style = app.theme.status_style(subsystem_health(sub.status));
        let mut spans = vec![
            Span::raw(format!(" {:<14}", name)),
            Span::styled(format!("{:<10}", sub.status.as_str()), style),
        ];
        if let Some(msg) = &sub.message {
            spans.push(Span::raw(msg.clone()));
        }
        Line::from(spans)
    };

    let lines = vec![
        line("Database", &system.database),
        line("API endpoints", &system.api_endpoints),
        line("Queue system", &system.queue_system),
    ];

    let title = format!(" System: {} ", overall.label());
    let paragraph = Paragraph::new(lines).block(
        block(app, title).border_style(app.theme.status_style(overall)),
    );
    frame.render_widget(paragraph, area);
}

fn render_sources(frame: &mut Frame, app: &App, area: Rect) {
    let Some(api) = app.api_health() else {
        render_empty(frame, app, area, " Sources ".to_string(), "No API health report yet");
        return;
    };
    if api.sources.is_empty() {
        render_empty(frame, app, area, " Sources (0) ".to_string(), "No sources reported");
        return;
    }

    let header = Row::new(vec!["Source", "Status", "Latency", "Errors", "Checked", "Message"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = api
        .sources
        .iter()
        .map(|s| {
            let style = if s.status == SubsystemStatus::Unknown {
                Style::default()
            } else {
                app.theme.status_style(subsystem_health(s.status))
            };
            Row::new(vec![
                Cell::from(s.source.clone()),
                Cell::from(s.status.as_str()).style(style),
                Cell::from(
                    s.response_time_ms
                        .map(|ms| format!("{}ms", ms))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(
                    s.error_rate
                        .map(|r| format!("{:.1}%", r * 100.0))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(s.last_check.as_deref().map(short_time).unwrap_or_default()),
                Cell::from(s.message.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Fill(2),
    ];

    let unhealthy = api.unhealthy_sources().count();
    let table = Table::new(rows, widths)
        .header(header)
        .block(block(
            app,
            format!(" Sources ({}, {} unhealthy) ", api.sources.len(), unhealthy),
        ))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}
