use crate::error::AppError;
use bcrypt::{hash, verify};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Minimum password length in characters.
pub const PASSWORD_MIN_CHARS: usize = 8;
/// Maximum password length in characters.
pub const PASSWORD_MAX_CHARS: usize = 100;

lazy_static! {
    static ref LOWERCASE: Regex = Regex::new(r"\p{Ll}").unwrap();
    static ref UPPERCASE: Regex = Regex::new(r"\p{Lu}").unwrap();
    static ref DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
}

/// Enforces the password policy: 8 to 100 characters with at least one lowercase
/// letter, one uppercase letter and one digit.
pub fn check_password_strength(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    let message = if length < PASSWORD_MIN_CHARS {
        Some("Password must be at least 8 characters long")
    } else if length > PASSWORD_MAX_CHARS {
        Some("Password must be at most 100 characters long")
    } else if !LOWERCASE.is_match(password) {
        Some("Password must contain a lowercase letter")
    } else if !UPPERCASE.is_match(password) {
        Some("Password must contain an uppercase letter")
    } else if !DIGIT.is_match(password) {
        Some("Password must contain a digit")
    } else {
        None
    };

    match message {
        Some(message) => {
            let mut error = ValidationError::new("password_strength");
            error.message = Some(message.into());
            Err(error)
        }
        None => Ok(()),
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
