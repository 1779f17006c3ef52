use crate::app::{App, Focus};
use crate::config::binding_matches;
use anyhow::Result;
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Terminal events
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// Key press event
    Key(KeyEvent),
    /// Terminal tick event
    Tick,
    /// Mouse event
    Mouse(MouseEvent),
}

/// Event handler for the terminal
pub struct EventHandler {
    /// Tick rate in milliseconds
    tick_rate: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            tick_rate: Duration::from_millis(tick_rate_ms),
        }
    }

    /// Poll for the next event
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                CEvent::Key(key) => return Ok(Event::Key(key)),
                CEvent::Mouse(m) => return Ok(Event::Mouse(m)),
                _ => {}
            }
        }
        Ok(Event::Tick)
    }
}

/// Handle key events for the application
pub fn handle_key_event(key: KeyEvent, app: &mut App) {
    // On Windows, crossterm reports both key press and release events.
    // We only want to handle press events to avoid duplicates.
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if key.code == KeyCode::BackTab || binding_matches(&app.config.keymap.switch_focus, &key) {
        app.switch_focus();
        return;
    }

    match app.focus {
        Focus::Form => handle_form_input(key, app),
        Focus::List => handle_list_input(key, app),
    }
}

/// Typing into the add-note form.
///
/// Plain Enter submits. Shift+Enter inserts a newline; Alt+Enter does the same for
/// terminals that cannot report Shift on Enter.
fn handle_form_input(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            app.form.insert_newline();
        }
        KeyCode::Enter => app.submit_note(),
        KeyCode::Backspace => app.form.backspace(),
        KeyCode::Esc => app.focus = Focus::List,
        KeyCode::Char(c) => {
            // Allow AltGr combinations (CONTROL+ALT) for special characters
            if !key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT) {
                app.form.insert_char(c);
            }
        }
        _ => {}
    }
}

fn handle_list_input(key: KeyEvent, app: &mut App) {
    let keymap = app.config.keymap.clone();

    if binding_matches(&keymap.quit, &key) || key.code == KeyCode::Esc {
        app.quit();
    } else if binding_matches(&keymap.toggle_favorite, &key) {
        app.toggle_favorite_selected();
    } else if binding_matches(&keymap.delete, &key) || key.code == KeyCode::Delete {
        app.delete_selected();
    } else {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.select_up(),
            KeyCode::Down | KeyCode::Char('j') => app.select_down(),
            // Empty-state call to action
            KeyCode::Char('a') | KeyCode::Enter if app.all_notes.is_empty() => app.focus_form(),
            _ => {}
        }
    }
}

/// Handle mouse events for the application
pub fn handle_mouse_event(mouse: MouseEvent, app: &mut App) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_up(),
        MouseEventKind::ScrollDown => app.select_down(),
        _ => {}
    }
}
