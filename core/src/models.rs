mod note;

pub use note::Note;

use chrono::{DateTime, Utc};

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a millisecond timestamp to DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Generate a fresh time-ordered note id
pub fn new_note_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
