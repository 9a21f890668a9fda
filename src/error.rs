//! Error taxonomy shared by the service client, the lifecycle machine and the collection.

use thiserror::Error;

/// Client-side pre-flight failures. These never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Password must be at least {min} characters long.")]
    PasswordTooShort { min: usize },
    #[error("Title is required.")]
    EmptyTitle,
    #[error("Enter the password to unlock this snippet.")]
    MissingPassword,
}

/// Every failure a snippet operation can surface to the user.
///
/// `Display` renders exactly the message meant for the user; service text is
/// carried through verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnipError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    WrongPassword(String),
    #[error("{0}")]
    Transport(String),
}

impl SnipError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnipError::NotFound(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SnipError::Transport(_))
    }
}

pub type SnipResult<T> = Result<T, SnipError>;
