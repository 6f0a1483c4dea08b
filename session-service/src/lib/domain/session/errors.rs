use thiserror::Error;

use crate::user::errors::UserError;

/// Error for reset-link delivery failures
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Top-level error for all session operations
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    // Input validation errors (caught before touching storage)
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Password must be at most {max} characters")]
    PasswordTooLong { max: usize },

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    // Credential errors. The login message stays vague so callers cannot
    // probe which emails have accounts.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    // Token state errors. The token is already proven to exist, so each
    // state gets its own specific message.
    #[error("Invalid or unknown token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Token has already been used")]
    TokenAlreadyUsed,

    // Domain-level errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("Too many password reset requests, try again later")]
    RateLimited,

    #[error("Failed to deliver reset email: {0}")]
    DeliveryFailed(String),

    #[error("Authentication required")]
    Unauthenticated,

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(#[from] credentials::PasswordError),

    #[error("Access token error: {0}")]
    AccessToken(#[from] credentials::AccessTokenError),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<UserError> for SessionError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailAlreadyExists(email) => SessionError::EmailAlreadyExists(email),
            UserError::NotFound(id) => SessionError::NotFound(format!("User {}", id)),
            UserError::DatabaseError(msg) => SessionError::DatabaseError(msg),
            other => SessionError::Unknown(other.to_string()),
        }
    }
}

impl From<MailerError> for SessionError {
    fn from(err: MailerError) -> Self {
        match err {
            MailerError::SendFailed(msg) => SessionError::DeliveryFailed(msg),
        }
    }
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        SessionError::Unknown(err.to_string())
    }
}
