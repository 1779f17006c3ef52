use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{millis_to_datetime, new_note_id, now_millis};
use crate::schema::{self, NoteCandidate, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Create a new note with a generated id, validating the title
    pub fn new(title: &str) -> Result<Self, ValidationErrors> {
        Self::with_id(new_note_id(), title)
    }

    /// Create a note with a specific ID (for testing or import)
    pub fn with_id(id: String, title: &str) -> Result<Self, ValidationErrors> {
        NoteCandidate::new(id, title).validate(now_millis())
    }

    /// Re-check the invariants of an already typed note.
    ///
    /// A note built by hand (or deserialized from storage) can carry an untrimmed
    /// or over-long title; this rejects anything the validator would not produce.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.id.is_empty() {
            errors.push("id", schema::ID_REQUIRED);
        }
        match schema::check_title(&self.title) {
            Ok(trimmed) if trimmed != self.title => errors.push("title", "Note title must be trimmed"),
            Ok(_) => {}
            Err(message) => errors.push("title", message),
        }
        if self.created_at < 0 {
            errors.push("created_at", "created_at must not be negative");
        }
        if self.updated_at >= schema::MAX_TIMESTAMP {
            errors.push("updated_at", "updated_at is out of range");
        }
        if self.updated_at < self.created_at {
            errors.push("updated_at", schema::UPDATED_BEFORE_CREATED);
        }
        errors.into_result(())
    }

    /// Bump the updated timestamp so it strictly increases.
    ///
    /// Fails, leaving the note untouched, once `updated_at` has no room left to advance.
    pub fn touch(&mut self, now: i64) -> Result<(), ValidationErrors> {
        let next = self
            .updated_at
            .checked_add(1)
            .map(|next| now.max(next))
            .filter(|next| *next < schema::MAX_TIMESTAMP);
        match next {
            Some(next) => {
                self.updated_at = next;
                Ok(())
            }
            None => {
                let mut errors = ValidationErrors::default();
                errors.push("updated_at", "updated_at is out of range");
                Err(errors)
            }
        }
    }

    pub fn created(&self) -> DateTime<Utc> {
        millis_to_datetime(self.created_at)
    }

}
