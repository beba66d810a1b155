//! Error types shared by every resource.
//!
//! Reads never panic or throw: every operation returns a [`ReadResult`].
//! [`ReadError`] is `Clone` so that memoising decorators can replay the exact
//! failure they recorded on every later call.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Underlying cause attached to a [`ReadError`].
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Result of any resource read.
pub type ReadResult<T> = Result<T, ReadError>;

/// Failure while reading a resource.
#[derive(Debug, Clone, Error)]
pub enum ReadError {
    /// The resource does not exist in its container.
    #[error("resource not found")]
    NotFound(#[source] Option<Cause>),

    /// Access to the resource was denied.
    #[error("access to the resource is forbidden")]
    Forbidden(#[source] Option<Cause>),

    /// The source is temporarily unreachable. Callers may retry later.
    #[error("resource is temporarily unavailable")]
    Unavailable(#[source] Option<Cause>),

    /// The bytes could not be interpreted as expected.
    #[error("failed to decode resource: {}", .message.as_deref().unwrap_or("malformed content"))]
    Decoding {
        message: Option<String>,
        #[source]
        cause: Option<Cause>,
    },

    /// Any other failure.
    #[error("failed to read resource: {0}")]
    Other(#[source] Cause),
}

impl ReadError {
    pub fn not_found() -> Self {
        ReadError::NotFound(None)
    }

    pub fn forbidden() -> Self {
        ReadError::Forbidden(None)
    }

    pub fn unavailable() -> Self {
        ReadError::Unavailable(None)
    }

    /// A decoding failure with a human-readable message.
    pub fn decoding(message: impl Into<String>) -> Self {
        ReadError::Decoding {
            message: Some(message.into()),
            cause: None,
        }
    }

    /// A decoding failure with both a message and the error that caused it.
    pub fn decoding_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ReadError::Decoding {
            message: Some(message.into()),
            cause: Some(Arc::new(cause)),
        }
    }

    /// Wraps an arbitrary error as [`ReadError::Other`].
    pub fn other<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        ReadError::Other(Arc::new(cause))
    }
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        let kind = err.kind();
        let cause: Cause = Arc::new(err);
        match kind {
            io::ErrorKind::NotFound => ReadError::NotFound(Some(cause)),
            io::ErrorKind::PermissionDenied => ReadError::Forbidden(Some(cause)),
            io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => ReadError::Unavailable(Some(cause)),
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ReadError::Decoding {
                message: None,
                cause: Some(cause),
            },
            _ => ReadError::Other(cause),
        }
    }
}

/// Failure while turning a locator into a [`Resource`](crate::Resource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MakeError {
    /// No factory handles this URL scheme.
    #[error("URL scheme not supported: {0}")]
    SchemeNotSupported(String),
}

impl MakeError {
    pub fn is_scheme_not_supported(&self) -> bool {
        matches!(self, MakeError::SchemeNotSupported(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_read_error_kinds() {
        let not_found = ReadError::from(io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(not_found, ReadError::NotFound(Some(_))));

        let denied = ReadError::from(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, ReadError::Forbidden(Some(_))));

        let timeout = ReadError::from(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(timeout, ReadError::Unavailable(Some(_))));

        let eof = ReadError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(eof, ReadError::Decoding { .. }));

        let other = ReadError::from(io::Error::other("boom"));
        assert!(matches!(other, ReadError::Other(_)));
    }

    #[test]
    fn decoding_message_is_displayed() {
        let err = ReadError::decoding("bad header");
        assert_eq!(err.to_string(), "failed to decode resource: bad header");

        let err = ReadError::from(io::Error::from(io::ErrorKind::InvalidData));
        assert_eq!(err.to_string(), "failed to decode resource: malformed content");
    }

    #[test]
    fn causes_are_exposed_as_sources() {
        let err = ReadError::decoding_with("bad utf-8", io::Error::other("inner"));
        assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("inner"));
        assert!(ReadError::not_found().source().is_none());
    }
}
