use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use super::{render_add_note, render_header, render_note_list, render_status_bar, render_summary, render_toasts};

/// Render the complete UI
pub fn render(frame: &mut Frame, app: &mut App) {
    let size = frame.size();

    // Counters only appear once there is something to count
    let summary_height = if app.summary().total > 0 { 3 } else { 0 };

    // Create main layout: header, counters, content, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),              // Header
            Constraint::Length(summary_height), // Summary counters
            Constraint::Min(0),                 // Content
            Constraint::Length(1),              // Status bar
        ])
        .split(size);

    render_header(frame, app, chunks[0]);
    if summary_height > 0 {
        render_summary(frame, app, chunks[1]);
    }
    render_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Toasts are drawn last, above the status bar
    let toast_area = Rect {
        height: size.height.saturating_sub(1),
        ..size
    };
    render_toasts(frame, app, toast_area);
}

/// Add-note form on the left, note list on the right
fn render_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Form
            Constraint::Percentage(60), // List
        ])
        .split(area);

    render_add_note(frame, app, main_chunks[0]);
    render_note_list(frame, app, main_chunks[1]);
}
