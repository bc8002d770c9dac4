//! Local validation of login and password forms

use crate::{SessionError, SessionResult};
use panel_core::PasswordChange;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Check the login form before anything is sent
pub fn validate_login(email: &str, password: &str, min_password_length: usize) -> SessionResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(SessionError::validation(
            "email",
            "Please enter your email address",
        ));
    }

    if !is_valid_email(email) {
        return Err(SessionError::validation(
            "email",
            "Please enter a valid email address",
        ));
    }

    if password.is_empty() {
        return Err(SessionError::validation(
            "password",
            "Please enter your password",
        ));
    }

    if password.chars().count() < min_password_length {
        return Err(SessionError::validation(
            "password",
            format!("Password must be at least {} characters", min_password_length),
        ));
    }

    Ok(())
}

/// Check the password change form before anything is sent
pub fn validate_password_change(
    change: &PasswordChange,
    min_password_length: usize,
) -> SessionResult<()> {
    if change.current_password.is_empty() {
        return Err(SessionError::validation(
            "current_password",
            "Please enter your current password",
        ));
    }

    if change.new_password.chars().count() < min_password_length {
        return Err(SessionError::validation(
            "new_password",
            format!("New password must be at least {} characters", min_password_length),
        ));
    }

    if change.new_password != change.confirm_password {
        return Err(SessionError::validation(
            "confirm_password",
            "Passwords do not match",
        ));
    }

    Ok(())
}
