//! Local format checks. Every function here is pure: a rejection never costs a
//! network round trip, and the remote validators call these first.

use super::error::{Field, FieldError};
use regex::Regex;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 12;
pub const PASSWORD_MIN_CHARS: usize = 6;
pub const PASSWORD_MAX_CHARS: usize = 20;
pub const CODE_DIGITS: usize = 4;
pub const TITLE_MAX_CHARS: usize = 100;
pub const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

pub type Check = Result<(), FieldError>;

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_ok_and(|re| re.is_match(email))
}

/// Login names: letters of any script, digits and underscores, 3 to 20 long.
#[must_use]
pub fn valid_login_name(name: &str) -> bool {
    Regex::new(r"^[\p{L}\p{N}_]{3,20}$").is_ok_and(|re| re.is_match(name))
}

/// # Errors
/// Returns a field error when the email is empty or malformed.
pub fn email(value: &str) -> Check {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(Field::Email, "please enter an email address"));
    }
    if !valid_email(value) {
        return Err(FieldError::new(Field::Email, "please enter a valid email address"));
    }
    Ok(())
}

/// # Errors
/// Returns a field error when the username is outside the allowed length.
pub fn username(value: &str) -> Check {
    let len = value.trim().chars().count();
    if len < USERNAME_MIN_CHARS || len > USERNAME_MAX_CHARS {
        return Err(FieldError::new(
            Field::Username,
            format!(
                "username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
            ),
        ));
    }
    Ok(())
}

/// # Errors
/// Returns a field error unless the code is exactly four ASCII digits.
pub fn verification_code(value: &str) -> Check {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(
            Field::VerificationCode,
            "please enter the verification code",
        ));
    }
    if value.len() != CODE_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::new(
            Field::VerificationCode,
            "verification code must be 4 digits",
        ));
    }
    Ok(())
}

/// # Errors
/// Returns a field error when the password is empty or outside the allowed length.
pub fn password(value: &str) -> Check {
    if value.is_empty() {
        return Err(FieldError::new(Field::Password, "please enter a password"));
    }
    let len = value.chars().count();
    if len < PASSWORD_MIN_CHARS || len > PASSWORD_MAX_CHARS {
        return Err(FieldError::new(
            Field::Password,
            format!(
                "password must be between {PASSWORD_MIN_CHARS} and {PASSWORD_MAX_CHARS} characters"
            ),
        ));
    }
    Ok(())
}

/// # Errors
/// Returns a field error when the confirmation differs from the password.
pub fn confirmation(password: &str, confirm: &str) -> Check {
    if password != confirm {
        return Err(FieldError::new(
            Field::ConfirmPassword,
            "the two passwords do not match",
        ));
    }
    Ok(())
}

/// Login accepts either an email address or a login name.
///
/// # Errors
/// Returns a field error when the identifier is empty or neither form matches.
pub fn identifier(value: &str) -> Check {
    let value = value.trim();
    if value.is_empty() {
        return Err(FieldError::new(
            Field::Identifier,
            "please enter a username or email",
        ));
    }
    if valid_email(value) || valid_login_name(value) {
        Ok(())
    } else {
        Err(FieldError::new(
            Field::Identifier,
            "invalid username (3-20 letters, digits or underscores)",
        ))
    }
}

/// # Errors
/// Returns a field error when the title is blank or too long.
pub fn title(value: &str) -> Check {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(FieldError::new(Field::Title, "please enter a title"));
    }
    if len > TITLE_MAX_CHARS {
        return Err(FieldError::new(
            Field::Title,
            format!("title must be at most {TITLE_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

/// # Errors
/// Returns a field error when the content is blank.
pub fn content(value: &str) -> Check {
    if value.trim().is_empty() {
        return Err(FieldError::new(Field::Content, "content cannot be empty"));
    }
    Ok(())
}

/// Only JPEG and PNG uploads up to 5 MiB are accepted.
///
/// # Errors
/// Returns a field error for other types or oversized files.
pub fn image(mime: &str, size: usize) -> Check {
    if !matches!(mime, "image/jpeg" | "image/png") {
        return Err(FieldError::new(
            Field::Image,
            "only JPG/PNG images are supported",
        ));
    }
    if size > IMAGE_MAX_BYTES {
        return Err(FieldError::new(Field::Image, "image cannot exceed 5MB"));
    }
    Ok(())
}

/// Infers the upload type from a file name, the way a browser file picker does.
#[must_use]
pub fn image_mime(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// # Errors
/// Returns a field error when no post is targeted.
pub fn post_id(value: u64) -> Check {
    if value == 0 {
        return Err(FieldError::new(Field::PostId, "missing post id"));
    }
    Ok(())
}

/// Runs every check and collects all failures.
#[must_use]
pub fn collect(checks: impl IntoIterator<Item = Check>) -> Vec<FieldError> {
    checks.into_iter().filter_map(Result::err).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rejects_malformed() {
        for bad in ["", "   ", "plain", "a@b", "a b@c.com", "@b.com", "a@.com "] {
            assert!(email(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(email("a@b.com").is_ok());
        assert!(email("  reader@echo.cn ").is_ok());
    }

    #[test]
    fn username_length_bounds() {
        assert!(username("a").is_err());
        assert!(username("ab").is_ok());
        assert!(username("忘书").is_ok());
        assert!(username("abcdefghijkl").is_ok());
        assert!(username("abcdefghijklm").is_err());
        assert!(username("   ").is_err());
    }

    #[test]
    fn verification_code_needs_four_digits() {
        assert_eq!(
            verification_code("").map_err(|e| e.message),
            Err("please enter the verification code".to_string())
        );
        for bad in ["123", "12345", "12a4", "１２３４"] {
            assert!(verification_code(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(verification_code("0420").is_ok());
    }

    #[test]
    fn password_bounds_and_confirmation() {
        assert!(password("").is_err());
        assert!(password("12345").is_err());
        assert!(password("123456").is_ok());
        assert!(password(&"p".repeat(21)).is_err());
        assert!(confirmation("secret1", "secret2").is_err());
        assert!(confirmation("secret1", "secret1").is_ok());
    }

    #[test]
    fn identifier_accepts_email_or_login_name() {
        assert!(identifier("reader@echo.cn").is_ok());
        assert!(identifier("reader_01").is_ok());
        assert!(identifier("读书人").is_ok());
        assert!(identifier("ab").is_err());
        assert!(identifier("bad name").is_err());
        assert!(identifier("").is_err());
    }

    #[test]
    fn image_type_and_size() {
        assert!(image("image/png", 1024).is_ok());
        assert!(image("image/gif", 1024).is_err());
        assert!(image("image/jpeg", IMAGE_MAX_BYTES + 1).is_err());
        assert_eq!(image_mime("cover.JPG"), Some("image/jpeg"));
        assert_eq!(image_mime("cover.png"), Some("image/png"));
        assert_eq!(image_mime("cover.webp"), None);
        assert_eq!(image_mime("cover"), None);
    }

    #[test]
    fn collect_keeps_every_failure() {
        let errors = collect([username("a"), email("nope"), verification_code("1234")]);
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Username, Field::Email]);
    }
}
