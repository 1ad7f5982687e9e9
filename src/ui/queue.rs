//! Queue view.
//!
//! Shows the current queue counts with trends, the failure ratio against the
//! configured thresholds, sentiment totals and the most recent queue entries.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{block, format_count, render_empty, render_sparkline, short_time};
use crate::app::App;
use crate::data::QueueSeries;

const TREND_WIDTH: usize = 20;

/// Render the Queue view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(queue) = app.snapshot().queue_status.as_ref() else {
        render_empty(
            frame,
            app,
            area,
            " Queue ".to_string(),
            "Waiting for the first queue update...",
        );
        return;
    };

    let chunks = Layout::vertical([Constraint::Length(8), Constraint::Min(4)]).split(area);

    let health = app.snapshot().queue_health(&app.thresholds);
    let ratio = queue.failure_ratio() * 100.0;

    let rate = |series| {
        app.history
            .rate(series)
            .map(|r| format!("{:+.1}/s", r))
            .unwrap_or_else(|| "-".to_string())
    };

    let counter = |label: &'static str, value: u64, series: Option<QueueSeries>| {
        let trend = series
            .map(|s| match s {
                QueueSeries::Pending => app.history.level_sparkline(s),
                _ => app.history.delta_sparkline(s),
            })
            .map(|data| render_sparkline(&data, TREND_WIDTH))
            .unwrap_or_default();
        let rate = series.map(rate).unwrap_or_default();
        Line::from(vec![
            Span::raw(format!(" {:<11}", label)),
            Span::styled(
                format!("{:>8}", format_count(value)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(trend, Style::default().fg(app.theme.highlight)),
            Span::raw(format!("  {}", rate)),
        ])
    };

    let mut lines = vec![
        counter("Pending", queue.pending, Some(QueueSeries::Pending)),
        counter("Processing", queue.processing, None),
        counter("Completed", queue.completed, Some(QueueSeries::Completed)),
        counter("Failed", queue.failed, Some(QueueSeries::Failed)),
        Line::from(vec![
            Span::raw(format!(" {:<11}{:>8}   ", "Total", format_count(queue.total()))),
            Span::raw("failure ratio "),
            Span::styled(
                format!("{:.1}% {}", ratio, health.label()),
                app.theme.status_style(health),
            ),
        ]),
    ];

    if let Some(sentiment) = &app.snapshot().sentiment {
        let brand = sentiment.brand.as_deref().unwrap_or("all brands");
        lines.push(Line::from(vec![
            Span::raw(format!(" Sentiment ({}): ", brand)),
            Span::styled(
                format!("+{}", sentiment.positive),
                Style::default().fg(app.theme.healthy),
            ),
            Span::raw(format!(" ={} ", sentiment.neutral)),
            Span::styled(
                format!("-{}", sentiment.negative),
                Style::default().fg(app.theme.critical),
            ),
        ]));
    }

    let summary = Paragraph::new(lines).block(block(app, " Queue ".to_string()));
    frame.render_widget(summary, chunks[0]);

    render_recent(frame, app, chunks[1]);
}

fn render_recent(frame: &mut Frame, app: &App, area: Rect) {
    let Some(queue) = app.snapshot().queue_status.as_ref() else {
        return;
    };
    if queue.recent_activity.is_empty() {
        render_empty(frame, app, area, " Recent (0) ".to_string(), "No recent queue entries");
        return;
    }

    let header = Row::new(vec!["Time", "User", "Source", "Status", "Error"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = queue
        .recent_activity
        .iter()
        .map(|item| {
            let status = item.status.as_deref().unwrap_or("-");
            let style = if status.eq_ignore_ascii_case("failed") {
                Style::default().fg(app.theme.critical)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(item.created_at.as_deref().map(short_time).unwrap_or_default()),
                Cell::from(item.user_id.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(item.source_type.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(status.to_string()).style(style),
                Cell::from(item.error.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Fill(2),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block(
            app,
            format!(" Recent ({}) ", queue.recent_activity.len()),
        ))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index));
    frame.render_stateful_widget(table, area, &mut state);
}
