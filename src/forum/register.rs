//! Registration: local checks, the ordered remote validators, the all-valid
//! gate and a single submission. Also hosts the verification code control,
//! which confirms the address is free before a code is sent.

use super::{
    api::{FormApi, Redirect, RegisterRequest},
    cooldown::{CodeDispatcher, Dispatch},
    error::{Field, FieldError, FormError},
    state::ValidationBoard,
    submitting::Submitting,
    validate,
    validator::{FieldCheck, FieldValidator},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

#[derive(Debug)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub code: String,
}

impl RegistrationForm {
    fn local_errors(&self) -> Vec<FieldError> {
        let password = self.password.expose_secret();
        validate::collect([
            validate::username(&self.username),
            validate::email(&self.email),
            validate::verification_code(&self.code),
            validate::password(password),
            validate::confirmation(password, self.confirm_password.expose_secret()),
        ])
    }

    fn request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: SecretString::from(self.password.expose_secret().to_owned()),
            confirm_password: SecretString::from(
                self.confirm_password.expose_secret().to_owned(),
            ),
            code: self.code.trim().to_string(),
        }
    }
}

pub struct Registration<A> {
    validator: FieldValidator<A>,
    submitting: Submitting,
    dispatcher: CodeDispatcher,
}

impl<A: FormApi> Registration<A> {
    pub fn new(api: A) -> Self {
        Self {
            validator: FieldValidator::new(api),
            submitting: Submitting::new(),
            dispatcher: CodeDispatcher::new(),
        }
    }

    #[must_use]
    pub fn with_submitting(mut self, submitting: Submitting) -> Self {
        self.submitting = submitting;
        self
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: CodeDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn validator(&self) -> &FieldValidator<A> {
        &self.validator
    }

    pub fn submitting(&self) -> &Submitting {
        &self.submitting
    }

    pub fn dispatcher(&self) -> &CodeDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn board(&self) -> ValidationBoard {
        self.validator.board()
    }

    /// Call when the user changes a field so a stale result cannot pass the gate.
    pub fn edited(&self, field: Field) {
        self.validator.edited(field);
    }

    /// Validates a single field, e.g. when it loses focus.
    ///
    /// # Errors
    /// See [`FieldValidator::validate_field`].
    pub async fn check(&self, check: FieldCheck<'_>) -> Result<(), FormError> {
        self.validator.validate_field(check).await
    }

    /// Sends a verification code once the address is known to be available.
    ///
    /// # Errors
    /// Returns the format or availability error for the address, or the
    /// dispatch failure.
    #[instrument(skip(self, email))]
    pub async fn request_code(&self, email: &str) -> Result<Dispatch, FormError> {
        if let Some(ignored) = self.dispatcher.blocked() {
            return Ok(ignored);
        }

        self.validator
            .validate_field(FieldCheck::Email(email))
            .await?;

        self.dispatcher
            .request_code(self.validator.api(), email)
            .await
    }

    /// Runs the whole submission. The submitting flag is raised for the
    /// duration of the call.
    ///
    /// # Errors
    /// Returns every local format error at once, the first remote validation
    /// failure, or the failure of the registration request itself.
    #[instrument(skip(self, form), fields(username = %form.username.trim()))]
    pub async fn submit(&self, form: &RegistrationForm) -> Result<Redirect, FormError> {
        let _submitting = self.submitting.begin();

        let errors = form.local_errors();
        if !errors.is_empty() {
            return Err(FormError::Format(errors));
        }

        // code first: it is the check most likely to fail
        self.validator
            .validate_field(FieldCheck::VerificationCode {
                email: &form.email,
                code: &form.code,
            })
            .await?;
        self.validator
            .validate_field(FieldCheck::Username(&form.username))
            .await?;
        self.validator
            .validate_field(FieldCheck::Email(&form.email))
            .await?;

        if let Some(field) = self.validator.board().first_not_valid() {
            return Err(FormError::validation(
                field,
                "value changed while it was being checked, please retry",
            ));
        }

        let redirect = self.validator.api().register(&form.request()).await?;

        info!(redirect = %redirect.target, "registration accepted");

        Ok(redirect)
    }
}
