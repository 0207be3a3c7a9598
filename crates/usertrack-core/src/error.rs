//! Error types for the core library.

use thiserror::Error;

/// Errors that abort a registration.
///
/// Mail delivery problems are not errors here; they surface as
/// [`crate::NotifyOutcome::Failed`].
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The user record cannot be stored.
    #[error("Invalid user: {0}")]
    InvalidUser(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
