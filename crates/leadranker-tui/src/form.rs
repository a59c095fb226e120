//! Keyboard-editable forms.
//!
//! A form is a column of text fields followed by a row of actions (buttons
//! and links). Focus moves over both with Tab/arrows; typing goes into the
//! focused field, Enter on an action triggers it.

/// Default maximum length for text input.
/// Emails, organization names and URLs all fit comfortably.
const MAX_TEXT_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_SECRET_LENGTH: usize = 128;

/// Lead messages can be whole emails.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
    max_len: usize,
}

impl Field {
    pub fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: false,
            max_len: MAX_TEXT_LENGTH,
        }
    }

    pub fn secret(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: true,
            max_len: MAX_SECRET_LENGTH,
        }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// What to draw: secrets are masked.
    pub fn display(&self) -> String {
        if self.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// Focus target within a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Field(usize),
    Action(usize),
}

#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub actions: Vec<&'static str>,
    focus: usize,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub busy: bool,
}

impl Form {
    pub fn new(fields: Vec<Field>, actions: Vec<&'static str>) -> Self {
        Self {
            fields,
            actions,
            focus: 0,
            error: None,
            notice: None,
            busy: false,
        }
    }

    fn slots(&self) -> usize {
        (self.fields.len() + self.actions.len()).max(1)
    }

    pub fn focus(&self) -> FormFocus {
        if self.focus < self.fields.len() {
            FormFocus::Field(self.focus)
        } else {
            FormFocus::Action(self.focus - self.fields.len())
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.slots();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.slots() - 1) % self.slots();
    }

    pub fn focus_field(&mut self, idx: usize) {
        if idx < self.fields.len() {
            self.focus = idx;
        }
    }

    /// Type a character into the focused field. Ignored on actions.
    pub fn insert(&mut self, c: char) {
        if let FormFocus::Field(idx) = self.focus() {
            let field = &mut self.fields[idx];
            if can_add_char(field.value.chars().count(), field.max_len, c) {
                field.value.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let FormFocus::Field(idx) = self.focus() {
            self.fields[idx].value.pop();
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, idx: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(idx) {
            field.value = value.into();
        }
    }

    /// Mark a submission in flight.
    pub fn begin(&mut self) {
        self.busy = true;
        self.error = None;
        self.notice = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.busy = false;
        self.error = Some(message.into());
    }

    pub fn succeed(&mut self, notice: Option<String>) {
        self.busy = false;
        self.error = None;
        self.notice = notice;
    }

    /// Forget a submission whose result will never be applied.
    pub fn abandon(&mut self) {
        self.busy = false;
    }

    /// Passwords never outlive a submission.
    pub fn clear_secrets(&mut self) {
        for field in self.fields.iter_mut().filter(|f| f.secret) {
            field.value.clear();
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
        self.error = None;
        self.notice = None;
        self.busy = false;
    }
}

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character should be accepted into a field holding `current_len` chars
pub fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_form() -> Form {
        Form::new(
            vec![Field::text("Email"), Field::secret("Password")],
            vec!["Sign In", "Create account"],
        )
    }

    #[test]
    fn test_can_add_char() {
        assert!(can_add_char(0, 10, 'a'));
        assert!(can_add_char(9, 10, 'z'));
        assert!(!can_add_char(10, 10, 'a'));
        assert!(!can_add_char(0, 10, '\x00'));
        assert!(!can_add_char(0, 10, '\n'));
        assert!(!can_add_char(0, 10, '\t'));
    }

    #[test]
    fn test_focus_cycles_fields_then_actions() {
        let mut form = login_form();
        assert_eq!(form.focus(), FormFocus::Field(0));
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focus(), FormFocus::Action(0));
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focus(), FormFocus::Field(0));
        form.focus_prev();
        assert_eq!(form.focus(), FormFocus::Action(1));
    }

    #[test]
    fn test_typing_goes_to_focused_field_only() {
        let mut form = login_form();
        form.insert('a');
        form.focus_next();
        form.insert('p');
        form.insert('w');
        form.focus_next();
        assert_eq!(form.focus(), FormFocus::Action(0));
        form.insert('x');

        assert_eq!(form.value(0), "a");
        assert_eq!(form.value(1), "pw");
        assert_eq!(form.fields[1].display(), "**");
    }

    #[test]
    fn test_max_len_respected() {
        let mut form = Form::new(vec![Field::text("Code").with_max_len(3)], vec![]);
        for c in "abcdef".chars() {
            form.insert(c);
        }
        assert_eq!(form.value(0), "abc");
    }

    #[test]
    fn test_clear_secrets_keeps_text() {
        let mut form = login_form();
        form.set_value(0, "agent@example.com");
        form.set_value(1, "hunter2");
        form.clear_secrets();
        assert_eq!(form.value(0), "agent@example.com");
        assert_eq!(form.value(1), "");
    }

    #[test]
    fn test_submission_lifecycle() {
        let mut form = login_form();
        form.fail("Invalid credentials");
        form.begin();
        assert!(form.busy);
        assert!(form.error.is_none());
        form.succeed(Some("Welcome".into()));
        assert!(!form.busy);
        assert_eq!(form.notice.as_deref(), Some("Welcome"));
    }

    #[test]
    fn test_abandon_keeps_input() {
        let mut form = login_form();
        form.set_value(0, "agent@example.com");
        form.fail("Invalid credentials");
        form.begin();
        form.abandon();
        assert!(!form.busy);
        assert_eq!(form.value(0), "agent@example.com");
    }
}
