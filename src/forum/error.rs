use std::fmt;
use thiserror::Error;

/// Maximum number of server message characters surfaced to the user.
const MAX_MESSAGE_CHARS: usize = 200;

/// Form inputs that can carry an inline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    VerificationCode,
    Password,
    ConfirmPassword,
    Identifier,
    Title,
    Content,
    Image,
    PostId,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::VerificationCode => "email_verify_code",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::Identifier => "identifier",
            Self::Title => "title",
            Self::Content => "content",
            Self::Image => "image",
            Self::PostId => "post_id",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("unable to reach the server")]
    Unreachable,
    #[error("request method not allowed by the server")]
    MethodNotAllowed,
    #[error("invalid response from the server: {0}")]
    Malformed(String),
    #[error("request failed ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{}", join_fields(.0))]
    Format(Vec<FieldError>),
    #[error("{0}")]
    Validation(FieldError),
    #[error("security token unavailable: {0}")]
    Token(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("server error ({status}), please try again later")]
    Server { status: u16 },
}

impl FormError {
    /// A single local format error.
    pub fn format(field: Field, message: impl Into<String>) -> Self {
        Self::Format(vec![FieldError::new(field, message)])
    }

    pub fn validation(field: Field, message: impl Into<String>) -> Self {
        Self::Validation(FieldError::new(field, message))
    }

    /// Field-scoped errors render inline; everything else is a global notice.
    #[must_use]
    pub fn field_errors(&self) -> Vec<&FieldError> {
        match self {
            Self::Format(errors) => errors.iter().collect(),
            Self::Validation(error) => vec![error],
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_field_scoped(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Validation(_))
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Timeout))
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Trims and truncates a server supplied message for display.
pub(crate) fn sanitize(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_MESSAGE_CHARS).collect()
    }
}
