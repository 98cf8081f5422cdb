//! Remote field validators for registration. Each check is rejected locally
//! when malformed, otherwise it costs exactly one request and records the
//! outcome on the shared [`ValidationBoard`].

use super::{
    api::FormApi,
    error::{Field, FormError},
    state::{FieldState, ValidationBoard, Validity},
    validate,
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck<'a> {
    Username(&'a str),
    Email(&'a str),
    VerificationCode { email: &'a str, code: &'a str },
}

impl FieldCheck<'_> {
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::Username(_) => Field::Username,
            Self::Email(_) => Field::Email,
            Self::VerificationCode { .. } => Field::VerificationCode,
        }
    }

    fn local(&self) -> validate::Check {
        match self {
            Self::Username(username) => validate::username(username),
            Self::Email(email) => validate::email(email),
            Self::VerificationCode { code, .. } => validate::verification_code(code),
        }
    }

    fn rejection(&self) -> &'static str {
        match self {
            Self::Username(_) => "username is already taken",
            Self::Email(_) => "email is already registered",
            Self::VerificationCode { .. } => "incorrect verification code",
        }
    }
}

pub struct FieldValidator<A> {
    api: A,
    board: Arc<Mutex<ValidationBoard>>,
}

impl<A: FormApi> FieldValidator<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            board: Arc::new(Mutex::new(ValidationBoard::new())),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn with_board<T>(&self, f: impl FnOnce(&mut ValidationBoard) -> T) -> T {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut board)
    }

    /// Snapshot of every tracked field.
    #[must_use]
    pub fn board(&self) -> ValidationBoard {
        self.with_board(|board| board.clone())
    }

    #[must_use]
    pub fn state(&self, field: Field) -> FieldState {
        self.with_board(|board| board.get(field))
    }

    /// Forgets a field's result after the user changes its value.
    pub fn edited(&self, field: Field) {
        self.with_board(|board| board.reset(field));
    }

    /// Validates one field.
    ///
    /// # Errors
    /// Returns `FormError::Format` without any request when the value is
    /// malformed, `FormError::Validation` when the server rejects it, or the
    /// transport error that prevented the check.
    #[instrument(skip(self, check), fields(field = %check.field()))]
    pub async fn validate_field(&self, check: FieldCheck<'_>) -> Result<(), FormError> {
        let field = check.field();

        if let Err(err) = check.local() {
            self.with_board(|board| {
                let ticket = board.begin(field);
                board.settle(ticket, Validity::Invalid);
            });
            return Err(FormError::Format(vec![err]));
        }

        let ticket = self.with_board(|board| board.begin(field));

        let result = match check {
            FieldCheck::Username(username) => self.api.check_username(username.trim()).await,
            FieldCheck::Email(email) => self.api.check_email(email.trim()).await,
            FieldCheck::VerificationCode { email, code } => {
                self.api.verify_code(email.trim(), code.trim()).await
            }
        };

        let (validity, outcome) = match result {
            Ok(verdict) if verdict.valid => (Validity::Valid, Ok(())),
            Ok(verdict) => (
                Validity::Invalid,
                Err(FormError::validation(
                    field,
                    verdict
                        .message
                        .unwrap_or_else(|| check.rejection().to_string()),
                )),
            ),
            Err(err) => (Validity::Unknown, Err(err)),
        };

        if !self.with_board(|board| board.settle(ticket, validity)) {
            debug!("discarding stale {field} check result");
        }

        outcome
    }
}
