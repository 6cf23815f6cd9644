// src/utils/validate.rs

use regex::Regex;
use std::sync::LazyLock;
use url::Url;
use validator::ValidationError;

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.]+$").expect("hardcoded username regex is valid")
});

/// Media types the product knows how to render. Anything else is stored but
/// logged.
pub const KNOWN_FILE_TYPES: &[&str] = &["image", "video"];

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Letters, digits, underscore and dot only.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::new("invalid_username")
            .with_message("Username may only contain letters, digits, '_' and '.'".into()));
    }
    Ok(())
}

/// Minimum-strength policy: 8..=128 chars with at least one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(ValidationError::new("password_length").with_message(
            format!(
                "Password length must be between {} and {} characters.",
                PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
            )
            .into(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(ValidationError::new("weak_password")
            .with_message("Password must contain at least one letter and one digit.".into()));
    }
    Ok(())
}

/// Accepts an absolute URL or a root-relative storage path.
pub fn validate_url_or_path(value: &str) -> Result<(), ValidationError> {
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(());
    }
    if Url::parse(value).is_err() {
        return Err(ValidationError::new("invalid_url"));
    }
    Ok(())
}

pub fn is_known_file_type(file_type: &str) -> bool {
    KNOWN_FILE_TYPES.contains(&file_type)
}
