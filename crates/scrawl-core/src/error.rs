//! Error types for scrawl-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using scrawl-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scrawl-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local input rejected before any remote call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The note store reported a failure
    #[error("Remote error: {0}")]
    Remote(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// No active session
    #[error("Not signed in")]
    NotAuthenticated,

    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Auth collaborator error
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Coarse classification used by front ends to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally; nothing was sent and nothing changed.
    Validation,
    /// Came back from (or failed on the way to) a collaborator.
    Remote,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::NotAuthenticated | Self::Config(_) => ErrorKind::Validation,
            Self::Remote(_)
            | Self::NotFound(_)
            | Self::Http(_)
            | Self::Serialization(_)
            | Self::Auth(_) => ErrorKind::Remote,
        }
    }

    /// Shorthand for the empty-text rejection shared by create and edit.
    pub(crate) fn empty_text() -> Self {
        Self::Validation("Note text cannot be empty".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_a_validation_error() {
        let error = Error::empty_text();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert!(error.to_string().contains("cannot be empty"));
    }

    #[test]
    fn store_failures_are_remote_errors() {
        assert_eq!(Error::Remote("boom".into()).kind(), ErrorKind::Remote);
        assert_eq!(Error::NotFound("n1".into()).kind(), ErrorKind::Remote);
        assert_eq!(
            Error::Auth(AuthError::Api("expired".into())).kind(),
            ErrorKind::Remote
        );
    }
}
