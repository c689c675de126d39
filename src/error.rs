//! Error types for message composition and session configuration.
//!
//! Every failure is raised at the call that violates the contract. Nothing in
//! this crate retries or recovers; callers decide what to do with the error.

use std::io;

use thiserror::Error;

/// Broad classification of an [`EmailError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or absent address input.
    Validation,
    /// Absent, empty or otherwise unusable argument.
    Argument,
    /// Operation not permitted in the current state.
    State,
    /// The mail session cannot be resolved from the current configuration.
    Configuration,
    /// The transport collaborator failed.
    Transport,
}

/// Errors that can occur while composing or sending an email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// An address list was expected but none was supplied.
    #[error("Address list provided was invalid")]
    MissingAddresses,

    /// A message cannot be sent without a sender.
    #[error("From address required")]
    MissingSender,

    /// A message cannot be sent without at least one recipient.
    #[error("At least one receiver address required")]
    MissingRecipients,

    /// An address failed syntax validation.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A required argument was absent, empty or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The charset label is not one we know how to encode.
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    /// The message has already been built once.
    #[error("The MimeMessage is already built")]
    AlreadyBuilt,

    /// A session cannot be built without a host.
    #[error("Cannot find valid hostname for mail session")]
    MissingHost,

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The transport refused or failed to deliver the message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Rendering the message to bytes failed.
    #[error("Failed to render message: {0}")]
    Render(#[from] io::Error),
}

impl EmailError {
    /// Returns the taxonomy bucket this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAddresses
            | Self::MissingSender
            | Self::MissingRecipients
            | Self::InvalidAddress { .. } => ErrorKind::Validation,
            Self::InvalidArgument(_) | Self::UnknownCharset(_) => ErrorKind::Argument,
            Self::AlreadyBuilt => ErrorKind::State,
            Self::MissingHost | Self::Config(_) => ErrorKind::Configuration,
            Self::Transport(_) | Self::Render(_) => ErrorKind::Transport,
        }
    }

    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

/// Specialized `Result` type for composition and session operations.
pub type Result<T> = anyhow::Result<T, EmailError>;

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmailError::invalid_address("abc", "missing '@'");
        assert_eq!(err.to_string(), "Invalid address 'abc': missing '@'");

        assert_eq!(
            EmailError::MissingHost.to_string(),
            "Cannot find valid hostname for mail session"
        );
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(EmailError::MissingAddresses.kind(), ErrorKind::Validation);
        assert_eq!(EmailError::MissingRecipients.kind(), ErrorKind::Validation);
        assert_eq!(
            EmailError::invalid_address("x", "bad").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EmailError::InvalidArgument("name".into()).kind(),
            ErrorKind::Argument
        );
        assert_eq!(
            EmailError::UnknownCharset("klingon".into()).kind(),
            ErrorKind::Argument
        );
        assert_eq!(EmailError::AlreadyBuilt.kind(), ErrorKind::State);
        assert_eq!(EmailError::MissingHost.kind(), ErrorKind::Configuration);
        assert_eq!(
            EmailError::Transport("refused".into()).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err = EmailError::from(io_err);

        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Failed to render message: pipe closed");
    }
}
