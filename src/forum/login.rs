//! Login with an optional remembered identifier. Any rejected credentials
//! surface as one error on the identifier field.

use super::{
    api::{FormApi, LoginRequest, LoginSuccess},
    error::FormError,
    remember::RememberStore,
    submitting::Submitting,
    validate,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct LoginForm {
    pub identifier: String,
    pub password: SecretString,
    pub remember: bool,
}

pub struct Login<A> {
    api: A,
    submitting: Submitting,
    remember: Option<RememberStore>,
}

impl<A: FormApi> Login<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            submitting: Submitting::new(),
            remember: None,
        }
    }

    #[must_use]
    pub fn with_remember(mut self, store: RememberStore) -> Self {
        self.remember = Some(store);
        self
    }

    #[must_use]
    pub fn with_submitting(mut self, submitting: Submitting) -> Self {
        self.submitting = submitting;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn submitting(&self) -> &Submitting {
        &self.submitting
    }

    /// Identifier to prefill, if one was remembered and has not expired.
    #[must_use]
    pub fn remembered(&self) -> Option<String> {
        self.remember.as_ref().and_then(RememberStore::load)
    }

    /// Logs in and updates the remembered identifier.
    ///
    /// # Errors
    /// Returns the local format errors, a single credentials error on the
    /// identifier for any rejected login, or the transport failure.
    #[instrument(skip(self, form), fields(identifier = %form.identifier.trim()))]
    pub async fn submit(&self, form: &LoginForm) -> Result<LoginSuccess, FormError> {
        let _submitting = self.submitting.begin();

        let errors = validate::collect([
            validate::identifier(&form.identifier),
            validate::password(form.password.expose_secret()),
        ]);
        if !errors.is_empty() {
            return Err(FormError::Format(errors));
        }

        let request = LoginRequest {
            identifier: form.identifier.trim().to_string(),
            password: SecretString::from(form.password.expose_secret().to_owned()),
            remember: form.remember,
        };
        let success = self.api.login(&request).await?;

        if let Some(store) = &self.remember {
            let result = if success.remember {
                store.store(&success.identifier)
            } else {
                store.clear()
            };
            if let Err(err) = result {
                warn!("{err}");
            }
        }

        info!(redirect = %success.redirect, "login accepted");

        Ok(success)
    }
}
