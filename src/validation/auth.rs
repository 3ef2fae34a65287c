use crate::error::{AppError, Result};

/// Validates a user's display name.
///
/// # Arguments
///
/// * `name` - The name to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the name is valid.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }

    if name.len() > 255 {
        return Err(AppError::Validation(
            "Name must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a university ID.
///
/// # Arguments
///
/// * `university_id` - The university ID to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the university ID is valid.
pub fn validate_university_id(university_id: &str) -> Result<()> {
    if university_id.is_empty() {
        return Err(AppError::Validation(
            "A user must have a university ID".to_string(),
        ));
    }

    if university_id.len() > 255 {
        return Err(AppError::Validation(
            "University ID must be at most 255 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is valid.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}
