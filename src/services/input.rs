//! Normalisation of user-supplied identifiers shared by the services.

use rand::{Rng, rng};

use crate::error::ServiceError;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Trim a display name and enforce the configured length limit.
pub fn clean_name(value: &str, max_len: usize, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{field} must not be blank")));
    }
    if trimmed.chars().count() > max_len {
        return Err(ServiceError::InvalidInput(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Strict form of a join code used when a session is created.
pub fn session_code(value: &str, length: usize) -> Result<String, ServiceError> {
    let code = lookup_code(value);
    if code.chars().count() != length || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ServiceError::InvalidInput(format!(
            "session code must be {length} letters or digits"
        )));
    }
    Ok(code)
}

/// Lenient form of a join code used for lookups.
pub fn lookup_code(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}

/// Random join code drawn from `A-Z0-9`.
pub fn generate_session_code(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
