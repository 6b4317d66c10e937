//! Text-entry forms and their validation rules.

use kanban_core::credentials::MAX_PASSWORD_BYTES;
use thiserror::Error;

/// Why a submitted form was rejected. The message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("username cannot be empty")]
    EmptyUsername,
    #[error("password cannot be empty")]
    EmptyPassword,
    #[error("username must be at least 3 characters")]
    UsernameTooShort,
    #[error("username cannot contain spaces")]
    UsernameHasSpaces,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("password must be at most 71 bytes")]
    PasswordTooLong,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("title cannot be empty")]
    EmptyTitle,
}

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// A single labelled input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl Field {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label)
        }
    }

    fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

/// An ordered group of fields with one of them focused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    fields: Vec<Field>,
    focus: usize,
}

impl Form {
    fn new(fields: Vec<Field>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn sign_in() -> Self {
        Self::new(vec![Field::new("Username"), Field::masked("Password")])
    }

    pub fn sign_up() -> Self {
        Self::new(vec![
            Field::new("Choose Username"),
            Field::masked("Choose Password"),
            Field::masked("Confirm Password"),
        ])
    }

    /// A task form, optionally pre-filled from the task being edited.
    pub fn task(title: &str, description: &str) -> Self {
        Self::new(vec![
            Field::new("Title").with_value(title),
            Field::new("Description").with_value(description),
        ])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_on_last_field(&self) -> bool {
        self.focus + 1 == self.fields.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    pub fn push_char(&mut self, c: char) {
        self.fields[self.focus].value.push(c);
    }

    pub fn backspace(&mut self) {
        self.fields[self.focus].value.pop();
    }

    fn value(&self, index: usize) -> &str {
        &self.fields[index].value
    }

    /// Username and password from a sign-in form.
    pub fn validate_sign_in(&self) -> Result<(String, String), FormError> {
        let (username, password) = (self.value(0), self.value(1));
        if username.is_empty() {
            return Err(FormError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(FormError::EmptyPassword);
        }
        Ok((username.to_string(), password.to_string()))
    }

    /// Username and password from a sign-up form.
    pub fn validate_sign_up(&self) -> Result<(String, String), FormError> {
        let (username, password, confirm) = (self.value(0), self.value(1), self.value(2));
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(FormError::UsernameTooShort);
        }
        if username.contains(' ') {
            return Err(FormError::UsernameHasSpaces);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort);
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(FormError::PasswordTooLong);
        }
        if password != confirm {
            return Err(FormError::PasswordMismatch);
        }
        Ok((username.to_string(), password.to_string()))
    }

    /// Title and description from a task form.
    pub fn validate_task(&self) -> Result<(String, String), FormError> {
        let title = self.value(0).trim();
        if title.is_empty() {
            return Err(FormError::EmptyTitle);
        }
        Ok((title.to_string(), self.value(1).to_string()))
    }
}
