use quicknotes_core::schema::TITLE_MAX_CHARS;

/// Where the add-note form currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Empty,
    Valid,
    /// Last submission failed; cleared by the next edit
    Rejected,
}

/// Input buffer for the add-note panel.
///
/// Input is capped at the title limit the same way a `maxLength` text area is,
/// so typing past it is ignored rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct AddNoteForm {
    input: String,
    rejection: Option<String>,
}

impl AddNoteForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    pub fn state(&self) -> FormState {
        if self.rejection.is_some() {
            FormState::Rejected
        } else if self.input.is_empty() {
            FormState::Empty
        } else {
            FormState::Valid
        }
    }

    /// Append a character; returns false once the limit is reached
    pub fn insert_char(&mut self, c: char) -> bool {
        if self.char_count() >= TITLE_MAX_CHARS {
            return false;
        }
        self.input.push(c);
        self.rejection = None;
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_char('\n')
    }

    pub fn backspace(&mut self) {
        if self.input.pop().is_some() {
            self.rejection = None;
        }
    }

    /// The text to submit, or `None` when there is nothing to send
    pub fn submission(&self) -> Option<&str> {
        if self.input.is_empty() {
            None
        } else {
            Some(&self.input)
        }
    }

    /// Submission was stored; back to empty
    pub fn accept(&mut self) {
        self.input.clear();
        self.rejection = None;
    }

    /// Submission failed; keep the input so the user can fix it
    pub fn reject(&mut self, message: impl Into<String>) {
        self.rejection = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut AddNoteForm, s: &str) {
        for c in s.chars() {
            form.insert_char(c);
        }
    }

    #[test]
    fn test_empty_to_valid_to_accepted() {
        let mut form = AddNoteForm::new();
        assert_eq!(form.state(), FormState::Empty);
        assert_eq!(form.submission(), None);

        type_str(&mut form, "Buy milk");
        assert_eq!(form.state(), FormState::Valid);
        assert_eq!(form.submission(), Some("Buy milk"));

        form.accept();
        assert_eq!(form.state(), FormState::Empty);
        assert_eq!(form.input(), "");
    }

    #[test]
    fn test_rejection_keeps_input_until_edit() {
        let mut form = AddNoteForm::new();
        type_str(&mut form, "   ");
        form.reject("Note title is required");

        assert_eq!(form.state(), FormState::Rejected);
        assert_eq!(form.input(), "   ");
        assert_eq!(form.rejection(), Some("Note title is required"));

        form.backspace();
        assert_eq!(form.state(), FormState::Valid);
    }

    #[test]
    fn test_input_capped_at_limit() {
        let mut form = AddNoteForm::new();
        type_str(&mut form, &"a".repeat(TITLE_MAX_CHARS));
        assert_eq!(form.char_count(), TITLE_MAX_CHARS);

        assert!(!form.insert_char('b'));
        assert!(!form.insert_newline());
        assert_eq!(form.char_count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn test_newline_and_backspace() {
        let mut form = AddNoteForm::new();
        type_str(&mut form, "line one");
        form.insert_newline();
        type_str(&mut form, "two");
        assert_eq!(form.input(), "line one\ntwo");

        for _ in 0..4 {
            form.backspace();
        }
        assert_eq!(form.input(), "line one");
    }
}
