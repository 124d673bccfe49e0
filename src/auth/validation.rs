//! Input validation rules shared by the auth use cases
//!
//! Each rule returns `Err(AuthError::Validation)` naming the offending field.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AuthError, AuthResult};

/// Minimum length for new passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum length accepted at sign-in; looser than the rule for new passwords
pub const MIN_SIGN_IN_PASSWORD_LENGTH: usize = 6;

/// Maximum length of a display or company name
pub const MAX_NAME_LENGTH: usize = 100;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9+_.-]+@([A-Za-z0-9.-]+\.[A-Za-z]{2,})$").expect("email regex is valid")
    })
}

/// Fails if the trimmed value is empty
pub fn require(field: &str, value: &str, label: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        Err(AuthError::validation(field, format!("{} is required", label)))
    } else {
        Ok(())
    }
}

/// True if the trimmed input looks like an email address
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

pub fn check_email(field: &str, email: &str) -> AuthResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AuthError::validation(field, "Please enter a valid email address"))
    }
}

/// True if the password has 8+ characters with upper case, lower case and a digit
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn check_password_strength(field: &str, password: &str) -> AuthResult<()> {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(AuthError::validation(
            field,
            "Password must be at least 8 characters and contain upper case, lower case and a digit",
        ))
    }
}

pub fn check_sign_in_password(field: &str, password: &str) -> AuthResult<()> {
    if password.chars().count() >= MIN_SIGN_IN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(AuthError::validation(
            field,
            format!("Password must be at least {} characters", MIN_SIGN_IN_PASSWORD_LENGTH),
        ))
    }
}

pub fn check_max_length(field: &str, value: &str, label: &str) -> AuthResult<()> {
    if value.trim().chars().count() <= MAX_NAME_LENGTH {
        Ok(())
    } else {
        Err(AuthError::validation(
            field,
            format!("{} must be at most {} characters", label, MAX_NAME_LENGTH),
        ))
    }
}

pub fn check_matches(field: &str, value: &str, confirmation: &str) -> AuthResult<()> {
    if value == confirmation {
        Ok(())
    } else {
        Err(AuthError::validation(field, "Passwords do not match"))
    }
}
