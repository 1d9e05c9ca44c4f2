//! Errors surfaced by a page fetch.

use std::fmt;
use thiserror::Error;

/// Failure of a single page fetch, as seen by the fetcher.
///
/// The remote client has already applied its own retries before any of
/// these reach the fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or connection failure, including timeouts.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a structured failure.
    #[error("Service error {code}: {message}")]
    Service { code: String, message: String },

    /// The response broke the paging contract (malformed or repeated token).
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The request was rejected before any remote call was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Coarse classification of a [`FetchError`], used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Service,
    Protocol,
    InvalidRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Service => write!(f, "service"),
            Self::Protocol => write!(f, "protocol"),
            Self::InvalidRequest => write!(f, "invalid_request"),
        }
    }
}

impl FetchError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::Service { .. } => ErrorKind::Service,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// True when the failure points at a collaborator bug rather than a
    /// transient condition.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}
