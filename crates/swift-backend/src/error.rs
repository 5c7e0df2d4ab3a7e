//! Error types for swift-backend

use crate::client::ClientError;
use thiserror::Error;

/// Reasons a location string cannot be turned into a [`Config`](crate::Config)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The location is not a URL at all
    #[error("invalid swift location: {0}")]
    InvalidUrl(String),

    /// A host was given; the location must use the `swift:///container` form
    #[error("hostname in swift location is not supported: {0}")]
    HostNotSupported(String),

    /// The first path segment (the container) is absent or empty
    #[error("missing container name in swift location")]
    MissingContainer,
}

/// Errors returned by backend operations
#[derive(Error, Debug)]
pub enum Error {
    /// The handle cannot address an object
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// The location string could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Authentication against the identity endpoint failed
    #[error("authentication failed: {source}")]
    AuthenticationFailed {
        /// Client error reported by the identity endpoint
        #[source]
        source: ClientError,
    },

    /// The container or object does not exist
    #[error("{op}: {key} not found")]
    NotFound {
        /// Client operation that failed
        op: &'static str,
        /// Remote key or container addressed
        key: String,
    },

    /// A save was attempted for a key that already exists
    #[error("key already exists: {key}")]
    AlreadyExists {
        /// Remote key that is taken
        key: String,
    },

    /// The read started at or past the end of the object, or the stream ended before any byte
    #[error("end of file reading {key} at offset {offset} (length {length})")]
    EndOfFile {
        /// Remote key read from
        key: String,
        /// Normalized start offset
        offset: u64,
        /// Length of the object
        length: u64,
    },

    /// Fewer bytes than requested were available; `read` bytes were delivered
    #[error("unexpected end of file reading {key}: got {read} of {requested} bytes")]
    UnexpectedEndOfFile {
        /// Remote key read from
        key: String,
        /// Bytes copied into the buffer
        read: usize,
        /// Length of the buffer passed in
        requested: usize,
    },

    /// Transport or protocol failure reported by the client
    #[error("{op} {key}: {source}")]
    Network {
        /// Client operation that failed
        op: &'static str,
        /// Remote key or container addressed
        key: String,
        /// Underlying client error
        #[source]
        source: ClientError,
    },

    /// The container was missing and could not be created
    #[error("creating container {container}: {source}")]
    ContainerCreateFailed {
        /// Container that was to be created
        container: String,
        /// Underlying client error
        #[source]
        source: ClientError,
    },

    /// The connection pool no longer hands out slots
    #[error("connection pool is closed")]
    PoolClosed,

    /// Configuration-related error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a client failure for `op` on `key`, keeping a missing object distinguishable.
    pub(crate) fn from_client(op: &'static str, key: &str, err: ClientError) -> Self {
        match err {
            ClientError::ObjectNotFound | ClientError::ContainerNotFound => Error::NotFound {
                op,
                key: key.to_string(),
            },
            source => Error::Network {
                op,
                key: key.to_string(),
                source,
            },
        }
    }

    /// Returns true if the error reports a missing container or object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Number of bytes delivered by a short read, if this error is one.
    pub fn short_read(&self) -> Option<usize> {
        match self {
            Error::UnexpectedEndOfFile { read, .. } => Some(*read),
            _ => None,
        }
    }
}

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;

        let kind = match &err {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::EndOfFile { .. } | Error::UnexpectedEndOfFile { .. } => ErrorKind::UnexpectedEof,
            Error::InvalidHandle(_) | Error::Parse(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::Other,
        };

        match err {
            Error::Io(io_err) => io_err,
            other => std::io::Error::new(kind, other),
        }
    }
}
