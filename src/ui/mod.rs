//! Terminal rendering with ratatui.
//!
//! ```text
//! ┌ header: connection, queue and system health ─────────────┐
//! │ tabs: 1:Queue 2:Health 3:Alerts 4:Activity 5:Errors 6:Logs│
//! │                                                          │
//! │ current view                                             │
//! │                                                          │
//! └ status bar: prompt, toast, or source + controls ─────────┘
//! ```

pub mod activity;
pub mod alerts;
pub mod common;
pub mod detail;
pub mod errors;
pub mod health;
pub mod logs;
pub mod queue;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, View};

/// Minimum terminal size for a usable display.
pub const MIN_WIDTH: u16 = 66;
pub const MIN_HEIGHT: u16 = 12;

/// Row where table content starts: header (1) + tabs (1) + block border (1).
pub const CONTENT_START_ROW: u16 = 3;

/// Draw the whole console for one frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(
            0,
            (area.height / 2).saturating_sub(2),
            area.width,
            5.min(area.height),
        );
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Queue => queue::render(frame, app, chunks[2]),
        View::Health => health::render(frame, app, chunks[2]),
        View::Alerts => alerts::render(frame, app, chunks[2]),
        View::Activity => activity::render(frame, app, chunks[2]),
        View::Errors => errors::render(frame, app, chunks[2]),
        View::Logs => logs::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    if app.show_detail_overlay {
        detail::render_overlay(frame, app, area);
    }

    if app.show_help {
        common::render_help(frame, app, area);
    }
}
