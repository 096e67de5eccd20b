//! Identity error types.

use agrichain_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::PasswordError;
use crate::storage::StorageError;

/// Identity operation errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Input rejected before any mutation.
    #[error("{0}")]
    Validation(String),

    /// Role tag outside the four recognized tags.
    #[error("unknown role: '{0}'")]
    UnknownRole(String),

    /// No account with this identifier.
    #[error("account not found: {0}")]
    NotFound(Uuid),

    /// Photo could not be stored.
    #[error("photo error: {0}")]
    Photo(#[from] StorageError),

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl IdentityError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation(msg) => Self::Validation(msg),
            IdentityError::UnknownRole(_) => Self::Validation(err.to_string()),
            IdentityError::NotFound(_) => Self::NotFound(err.to_string()),
            IdentityError::Photo(ref e) if e.is_rejected_upload() => {
                Self::Validation(err.to_string())
            }
            IdentityError::Photo(_) | IdentityError::Password(_) => {
                Self::Internal(err.to_string())
            }
            IdentityError::Repository(msg) => Self::Database(msg),
        }
    }
}
