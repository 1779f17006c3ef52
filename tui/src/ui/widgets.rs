use crate::app::{App, Focus, ToastKind};
use crate::form::FormState;
use quicknotes_core::schema::TITLE_MAX_CHARS;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const SKELETON_ROWS: usize = 4;

/// Render the header with the app title and tagline
pub fn render_header(frame: &mut Frame, _app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "My Simple Notes",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Capture your thoughts, organize your ideas. All your data is stored locally",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let header = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(header, area);
}

/// Render the total / favorite counters
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary = app.summary();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20),
            Constraint::Length(20),
            Constraint::Min(0),
        ])
        .split(area);

    for (chunk, count, label) in [
        (chunks[0], summary.total, " Total Notes "),
        (chunks[1], summary.favorites, " Favorite Notes "),
    ] {
        let counter = Paragraph::new(Span::styled(
            count.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::ALL).title(label))
        .alignment(Alignment::Center);
        frame.render_widget(counter, chunk);
    }
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(border))
}

/// Render the add-note form
pub fn render_add_note(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Form;
    let block = panel_block(" Add New Note ", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let input = if app.form.input().is_empty() && !focused {
        Text::from(Span::styled("Enter Note...", Style::default().fg(Color::DarkGray)))
    } else {
        let cursor = if focused { "▊" } else { "" };
        Text::from(format!("{}{}", app.form.input(), cursor))
    };
    let input_style = match app.form.state() {
        FormState::Rejected => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Yellow),
    };
    frame.render_widget(
        Paragraph::new(input).style(input_style).wrap(Wrap { trim: false }),
        chunks[0],
    );

    let feedback = match app.form.rejection() {
        Some(message) => Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        None => Line::from(""),
    };
    frame.render_widget(Paragraph::new(feedback), chunks[1]);

    let footer = Line::from(vec![
        Span::styled(
            format!("{}/{} characters", app.form.char_count(), TITLE_MAX_CHARS),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled("[Enter] Save", Style::default().fg(Color::Green)),
    ]);
    frame.render_widget(Paragraph::new(footer), chunks[2]);
}

/// Render the note list, its loading placeholder or its empty state
pub fn render_note_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::List;
    let block = panel_block(" A list of all notes ", focused);

    if app.is_loading() {
        let inner = block.inner(area);
        let mut lines = vec![
            Line::from(Span::styled(
                "Loading notes, please wait",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
        ];
        let skeleton = "░".repeat(inner.width.saturating_sub(2) as usize);
        for _ in 0..SKELETON_ROWS {
            lines.push(Line::from(Span::styled(skeleton.clone(), Style::default().fg(Color::DarkGray))));
            lines.push(Line::from(""));
        }
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    if app.all_notes.is_empty() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No Notes Yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "You haven't created any notes yet. Get started by creating your first note.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(Span::styled("[a] Add new note", Style::default().fg(Color::Green))),
        ];
        let empty = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    // Room left for the title after borders and the star marker
    let title_width = area.width.saturating_sub(6) as usize;
    let items: Vec<ListItem> = app.all_notes.with_data(|notes| {
        notes
            .iter()
            .map(|note| {
                let (marker, marker_style) = if note.is_favorite {
                    ("★ ", Style::default().fg(Color::Yellow))
                } else {
                    ("☆ ", Style::default().fg(Color::DarkGray))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, marker_style),
                    Span::raw(truncate_to_width(&single_line(&note.title), title_width)),
                ]))
            })
            .collect()
    });

    let mut state = ListState::default();
    state.select(Some(app.selected));

    let highlight = if focused {
        Style::default().bg(Color::Blue).fg(Color::Black)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let list = List::new(items).block(block).highlight_style(highlight);

    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the status bar at the bottom
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_text = match app.focus {
        Focus::Form => " Editing | [Enter] Save | [Shift+Enter] Newline | [Tab] Notes | [Ctrl+C] Quit ".to_string(),
        Focus::List => format!(
            " Notes | [↑/↓] Select | [{}] Favorite | [{}] Delete | [Tab] Add note | [{}] Quit ",
            app.config.keymap.toggle_favorite, app.config.keymap.delete, app.config.keymap.quit
        ),
    };

    let status_bar = Paragraph::new(status_text)
        .style(Style::default().bg(Color::DarkGray).fg(Color::White))
        .alignment(Alignment::Center);

    frame.render_widget(status_bar, area);
}

/// Render pending toasts stacked at the bottom center of `area`
pub fn render_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let mut bottom = area.y + area.height;

    for toast in app.toasts.iter().rev() {
        let width = (UnicodeWidthStr::width(toast.message.as_str()) as u16 + 4).min(area.width);
        let height = 3;
        if bottom < area.y + height {
            break;
        }
        bottom -= height;

        let popup_area = Rect::new(area.x + (area.width.saturating_sub(width)) / 2, bottom, width, height);
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        let paragraph = Paragraph::new(toast.message.as_str())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            )
            .style(Style::default().fg(color))
            .alignment(Alignment::Center);

        frame.render_widget(Clear, popup_area); // This clears the area behind the toast
        frame.render_widget(paragraph, popup_area);
    }
}

fn single_line(title: &str) -> String {
    title.split('\n').collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_width` terminal columns, marking the cut with an ellipsis
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
