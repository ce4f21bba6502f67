//! Custom error types specific to authentication failures.
//!
//! These are the errors a visitor can trigger on the register and login
//! forms, plus the server-side hashing failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email and wrong password deliberately share this message.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("please enter a valid email address")]
    InvalidEmail,

    #[error("name must be between 1 and {max} characters")]
    InvalidName { max: usize },

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Whether the visitor caused this error (422) rather than the server (500).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Hashing(_))
    }
}
