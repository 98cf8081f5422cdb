//! Rendering adapter. Field-scoped errors are shown next to their field and go
//! away when that field is edited; everything else becomes one global notice.

use super::error::{Field, FormError};
use std::{collections::BTreeMap, io};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    inline: BTreeMap<Field, String>,
    notice: Option<String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error from a workflow.
    pub fn apply(&mut self, err: &FormError) {
        if err.is_field_scoped() {
            for error in err.field_errors() {
                self.inline.insert(error.field, error.message.clone());
            }
        } else {
            self.notice = Some(err.to_string());
        }
    }

    pub fn edited(&mut self, field: Field) {
        self.inline.remove(&field);
    }

    pub fn clear(&mut self) {
        self.inline.clear();
        self.notice = None;
    }

    #[must_use]
    pub fn field(&self, field: Field) -> Option<&str> {
        self.inline.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.notice.is_none()
    }

    /// Writes inline errors in field order, then the notice.
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails.
    pub fn render(&self, out: &mut impl io::Write) -> io::Result<()> {
        for (field, message) in &self.inline {
            writeln!(out, "  {field}: {message}")?;
        }
        if let Some(notice) = &self.notice {
            writeln!(out, "error: {notice}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forum::error::{FieldError, TransportError};

    #[test]
    fn field_errors_render_inline_until_edited() {
        let mut errors = FormErrors::new();
        errors.apply(&FormError::Format(vec![
            FieldError::new(Field::Email, "invalid email address"),
            FieldError::new(Field::Username, "too short"),
        ]));

        assert_eq!(errors.field(Field::Email), Some("invalid email address"));
        assert_eq!(errors.notice(), None);

        errors.edited(Field::Email);
        assert_eq!(errors.field(Field::Email), None);
        assert_eq!(errors.field(Field::Username), Some("too short"));
    }

    #[test]
    fn workflow_errors_become_a_notice() {
        let mut errors = FormErrors::new();
        errors.apply(&TransportError::Timeout.into());

        assert_eq!(errors.notice(), Some("request timed out"));
        errors.edited(Field::Username);
        assert_eq!(errors.notice(), Some("request timed out"));

        errors.clear();
        assert!(errors.is_empty());
    }

    #[test]
    fn render_lists_fields_then_notice() {
        let mut errors = FormErrors::new();
        errors.apply(&FormError::validation(Field::Email, "email is already registered"));
        errors.apply(&FormError::validation(Field::Username, "username is already taken"));
        errors.apply(&FormError::Server { status: 502 });

        let mut out = Vec::new();
        errors.render(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  username: username is already taken\n  email: email is already registered\nerror: server error (502), please try again later\n"
        );
    }
}
