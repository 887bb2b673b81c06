use std::fmt;

use thiserror::Error;

/// Maximum length for error response bodies in log messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Login form field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Username => write!(f, "username"),
            Field::Password => write!(f, "password"),
        }
    }
}

/// Per-field validation messages, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(Field, String)>,
}

impl FieldErrors {
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.iter().map(|(field, _)| *field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|(_, m)| m.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Errors surfaced by the portal client. `Display` is the message shown to
/// the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Empty credential fields, resolved locally
    #[error("{0}")]
    Validation(FieldErrors),

    /// Server answered 2xx with a body of the wrong shape
    #[error("{0}")]
    Protocol(String),

    /// No response received (connection failure or timeout)
    #[error("{0}")]
    Network(String),

    /// Server returned a non-2xx status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Session could not be kept alive; tokens have been cleared
    #[error("{0}")]
    AuthExpired(String),

    /// Caller-supplied input was unusable
    #[error("{0}")]
    Input(String),

    /// Share data was not the expected array
    #[error("{0}")]
    DataFormat(String),
}

impl ApiError {
    /// Build an `Http` error from a response, preferring the server's own
    /// `message` field over `fallback`.
    pub fn from_status(status: u16, body: &str, fallback: impl Into<String>) -> Self {
        let message = server_message(body).unwrap_or_else(|| fallback.into());
        ApiError::Http { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired(_))
    }

    /// Message for display.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Extract the `message` field of a JSON error body.
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Truncate a response body to avoid logging excessive data
pub fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
