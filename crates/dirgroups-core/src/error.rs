//! Error types for dirgroups

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or incomplete configuration. Never retried.
    Configuration,
    /// The directory (or the session talking to it) reported a failure.
    DirectoryOperation,
}

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("Membership attribute is not set in configurations")]
    MissingMembershipAttribute,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Directory Errors
    #[error("Failed to connect to LDAP server: {0}")]
    Connection(String),

    #[error("LDAP bind failed: {0}")]
    Bind(String),

    #[error("LDAP search failed on '{base}': {message}")]
    Search { base: String, message: String },

    #[error("Invalid distinguished name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("LDAP operation failed: {0}")]
    Directory(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingMembershipAttribute => "MissingMembershipAttribute",
            Error::InvalidConfig(_) => "InvalidConfiguration",
            Error::Connection(_) => "ConnectionFailed",
            Error::Bind(_) => "BindFailed",
            Error::Search { .. } => "SearchFailed",
            Error::InvalidName { .. } => "InvalidName",
            Error::Directory(_) => "DirectoryError",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingMembershipAttribute | Error::InvalidConfig(_) => ErrorKind::Configuration,
            _ => ErrorKind::DirectoryOperation,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn search(base: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Search {
            base: base.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
