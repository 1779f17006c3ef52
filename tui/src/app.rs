use crate::config::Config;
use crate::form::AddNoteForm;
use quicknotes_core::{
    models::Note,
    query::Query,
    schema::NoteCandidate,
    storage::{KeyValueStore, LiveQuery, NoteStore, Summary},
    Error,
};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub type DynNoteStore = NoteStore<Box<dyn KeyValueStore>>;

/// Maximum number of toasts stacked on screen at once
const MAX_TOASTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Form,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient notification shown at the bottom of the screen
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

/// Application state
pub struct App {
    pub should_quit: bool,
    pub store: DynNoteStore,
    pub config: Config,
    /// Every note, newest first; drives the list and the total counter
    pub all_notes: LiveQuery,
    pub favorite_notes: LiveQuery,
    pub form: AddNoteForm,
    pub focus: Focus,
    pub selected: usize,
    pub toasts: Vec<Toast>,
}

impl App {
    /// Create the app over `storage`. The collection is not read until [`App::load`].
    pub fn new(storage: Box<dyn KeyValueStore>, config: Config) -> Self {
        let mut store = NoteStore::new(storage, config.storage.storage_key.clone());
        let all_notes = store.live_query(Query::newest_first());
        let favorite_notes = store.live_query(Query::favorites());

        Self {
            should_quit: false,
            store,
            config,
            all_notes,
            favorite_notes,
            form: AddNoteForm::new(),
            focus: Focus::Form,
            selected: 0,
            toasts: Vec::new(),
        }
    }

    /// Read the collection; live queries resolve here
    pub fn load(&mut self) {
        if let Err(err) = self.store.load() {
            warn!(error = %err, "Failed to load notes");
            self.notify_error(format!("Failed to load notes: {}", err));
        }
        let skipped = self.store.skipped_count();
        if skipped > 0 {
            self.notify_error(format!("{} stored notes could not be read", skipped));
        }
        self.clamp_selection();
    }

    pub fn is_loading(&self) -> bool {
        self.all_notes.is_loading()
    }

    /// Counters derived from the two live queries
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.all_notes.len(),
            favorites: self.favorite_notes.len(),
        }
    }

    pub fn selected_note(&self) -> Option<Note> {
        self.all_notes
            .with_data(|notes| notes.get(self.selected).cloned())
    }

    /// Validate the form input and insert it as a new note
    pub fn submit_note(&mut self) {
        let Some(title) = self.form.submission().map(str::to_string) else {
            return;
        };

        let candidate = NoteCandidate::new(self.store.generate_id(), title);
        let note = match candidate.validate(self.store.now_millis()) {
            Ok(note) => note,
            Err(errors) => {
                debug!(%errors, "Rejected note");
                let message = errors
                    .errors()
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                self.form.reject(message);
                self.notify_error("Failed to save note.");
                return;
            }
        };

        match self.store.insert(note) {
            Ok(()) => {
                self.form.accept();
                self.selected = 0;
                self.notify_success("Note Added");
            }
            Err(err) => {
                warn!(error = %err, "Failed to insert note");
                self.form.reject(err.to_string());
                self.notify_error("Failed to save note.");
            }
        }
    }

    pub fn toggle_favorite_selected(&mut self) {
        let Some(note) = self.selected_note() else {
            return;
        };
        if let Err(err) = self.store.toggle_favorite(&note.id) {
            self.report(err);
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(note) = self.selected_note() else {
            return;
        };
        match self.store.delete(&note.id) {
            Ok(_) => self.notify_success("Note deleted"),
            Err(err) => self.report(err),
        }
        self.clamp_selection();
    }

    fn report(&mut self, err: Error) {
        warn!(error = %err, "Note operation failed");
        match err {
            Error::NotFound(_) => self.notify_error("That note no longer exists"),
            other if other.is_storage() => {
                self.notify_error(format!("Could not save changes: {}", other))
            }
            other => self.notify_error(other.to_string()),
        }
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        if self.selected + 1 < self.all_notes.len() {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.all_notes.len().saturating_sub(1));
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Form => Focus::List,
            Focus::List => Focus::Form,
        };
    }

    pub fn focus_form(&mut self) {
        self.focus = Focus::Form;
    }

    pub fn notify_success(&mut self, message: impl Into<String>) {
        self.push_toast(message.into(), ToastKind::Success);
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.push_toast(message.into(), ToastKind::Error);
    }

    fn push_toast(&mut self, message: String, kind: ToastKind) {
        let ttl = Duration::from_millis(self.config.ui.toast_duration_ms);
        self.toasts.push(Toast {
            message,
            kind,
            expires_at: Instant::now() + ttl,
        });
        if self.toasts.len() > MAX_TOASTS {
            self.toasts.remove(0);
        }
    }

    /// Handle tick events
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires_at > now);
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
