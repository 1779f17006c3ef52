//! Note schema: turns loosely typed candidate data into a validated [`Note`].
//!
//! Validation never panics and never touches storage. Every violated field is
//! reported, so a caller can surface all problems at once.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::Note;

pub const TITLE_MAX_CHARS: usize = 100;

/// Exclusive upper bound for stored timestamps; leaves room for `updated_at` to advance
pub const MAX_TIMESTAMP: i64 = i64::MAX;

pub const ID_REQUIRED: &str = "ID is required";
pub const TITLE_REQUIRED: &str = "Note title is required";
pub const TITLE_TOO_LONG: &str = "Note should not be more than 100 characters";
pub const UPDATED_BEFORE_CREATED: &str = "updated_at must not be earlier than created_at";

/// A single constraint violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every constraint a candidate violated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn field(&self, name: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub(crate) fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Typed candidate for callers that already hold Rust values.
///
/// Optional fields are defaulted during validation exactly like absent JSON fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCandidate {
    pub id: String,
    pub title: String,
    pub is_favorite: Option<bool>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl NoteCandidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self, now: i64) -> Result<Note, ValidationErrors> {
        validate_note(
            &json!({
                "id": self.id,
                "title": self.title,
                "is_favorite": self.is_favorite,
                "created_at": self.created_at,
                "updated_at": self.updated_at,
            }),
            now,
        )
    }
}

/// Check a raw title, returning the trimmed form on success
pub fn check_title(raw: &str) -> Result<String, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TITLE_REQUIRED);
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(TITLE_TOO_LONG);
    }
    Ok(trimmed.to_string())
}

/// Validate a candidate note.
///
/// `now` fills in an absent `created_at`; an absent `updated_at` copies `created_at`.
pub fn validate_note(candidate: &Value, now: i64) -> Result<Note, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let Some(obj) = candidate.as_object() else {
        errors.push("_root", "Expected a note object");
        return Err(errors);
    };

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::String(_)) | Some(Value::Null) | None => {
            errors.push("id", ID_REQUIRED);
            String::new()
        }
        Some(_) => {
            errors.push("id", "ID must be a string");
            String::new()
        }
    };

    let title = match obj.get("title") {
        Some(Value::String(s)) => check_title(s).unwrap_or_else(|message| {
            errors.push("title", message);
            String::new()
        }),
        Some(Value::Null) | None => {
            errors.push("title", TITLE_REQUIRED);
            String::new()
        }
        Some(_) => {
            errors.push("title", "Note title must be a string");
            String::new()
        }
    };

    let is_favorite = match obj.get("is_favorite") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Null) | None => false,
        Some(_) => {
            errors.push("is_favorite", "is_favorite must be a boolean");
            false
        }
    };

    let created_at = timestamp_field(obj, "created_at", &mut errors);
    let updated_at = timestamp_field(obj, "updated_at", &mut errors);

    let (created_at, updated_at) = match (created_at, updated_at) {
        (Ok(created), Ok(updated)) => {
            let created = created.unwrap_or(now);
            let updated = updated.unwrap_or(created);
            if updated < created {
                errors.push("updated_at", UPDATED_BEFORE_CREATED);
            }
            (created, updated)
        }
        _ => (0, 0),
    };

    errors.into_result(Note {
        id,
        title,
        is_favorite,
        created_at,
        updated_at,
    })
}

/// Read an optional millisecond timestamp; `Err` means an error was recorded
fn timestamp_field(
    obj: &Map<String, Value>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Result<Option<i64>, ()> {
    let n = match obj.get(field) {
        Some(Value::Null) | None => return Ok(None),
        Some(Value::Number(n)) => n,
        Some(_) => {
            errors.push(field, format!("{} must be a number", field));
            return Err(());
        }
    };

    // Integers beyond i64 and floats outside it must not be clamped into range
    let millis = match n.as_i64() {
        Some(ms) => Some(ms),
        None if n.is_u64() => None,
        None => n
            .as_f64()
            .map(f64::trunc)
            .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64),
    };

    match millis {
        Some(ms) if ms < 0 => {
            errors.push(field, format!("{} must not be negative", field));
            Err(())
        }
        Some(ms) if ms < MAX_TIMESTAMP => Ok(Some(ms)),
        _ => {
            errors.push(field, format!("{} is out of range", field));
            Err(())
        }
    }
}
