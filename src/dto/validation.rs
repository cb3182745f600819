//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a session join code only contains ASCII letters and digits.
///
/// Length is checked by the session service against the configured code length,
/// lower-case letters are accepted and upper-cased there.
///
/// # Examples
///
/// ```ignore
/// validate_session_code("AB12CD") // Ok
/// validate_session_code("ab12cd") // Ok - normalised later
/// validate_session_code("AB-12C") // Err - punctuation
/// ```
pub fn validate_session_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        let mut err = ValidationError::new("session_code_empty");
        err.message = Some("Session code must not be empty".into());
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("session_code_format");
        err.message = Some("Session code must contain only letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a free-text field (name, password) is not blank.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}
