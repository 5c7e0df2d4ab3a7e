//! Boundary to the remote Swift service
//!
//! The backend never speaks the wire protocol itself. Everything it needs from the
//! object store is expressed by [`SwiftClient`] and the [`ObjectReader`] streams it
//! opens, so any transport (HTTP client, in-memory fake, recording wrapper) can sit
//! behind a [`SwiftBackend`](crate::SwiftBackend).

use crate::config::Credentials;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use thiserror::Error;

/// Extra headers sent along with a request, e.g. `X-Storage-Policy`.
pub type Headers = BTreeMap<String, String>;

/// Failures reported by a [`SwiftClient`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The addressed container does not exist
    #[error("container not found")]
    ContainerNotFound,

    /// The addressed object does not exist
    #[error("object not found")]
    ObjectNotFound,

    /// The credentials or token were rejected
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Connection level failure (DNS, TCP, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an unexpected status
    #[error("unexpected status {code}: {message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body or reason phrase
        message: String,
    },
}

/// Result type for [`SwiftClient`] calls
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Metadata of a single object as returned by a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object name inside the container
    pub name: String,
    /// Size in bytes
    pub bytes: u64,
    /// Content type recorded at upload time
    pub content_type: String,
}

/// Metadata of a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Container name
    pub name: String,
    /// Number of objects stored
    pub count: u64,
    /// Total bytes stored
    pub bytes: u64,
}

/// Options for one page of an object name listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOpts {
    /// Only return names starting with this prefix
    pub prefix: Option<String>,
    /// Only return names sorting strictly after this one
    pub marker: Option<String>,
    /// Maximum number of names in the page
    pub limit: Option<usize>,
}

/// A readable, seekable handle on a remote object
#[async_trait]
pub trait ObjectReader: Send {
    /// Total length of the object in bytes
    async fn length(&mut self) -> ClientResult<u64>;

    /// Move the read position to `offset` bytes from the start
    async fn seek(&mut self, offset: u64) -> ClientResult<u64>;

    /// Read into `buf`, returning 0 once the stream is exhausted
    async fn read(&mut self, buf: &mut [u8]) -> ClientResult<usize>;

    /// Release the underlying connection
    async fn close(self: Box<Self>) -> ClientResult<()>;
}

/// Primitive operations of a Swift connection
#[async_trait]
pub trait SwiftClient: Send + Sync {
    /// Whether the connection already holds a usable token
    fn is_authenticated(&self) -> bool;

    /// Use a pre-obtained storage URL and token instead of authenticating
    fn use_token(&self, storage_url: &str, auth_token: &str);

    /// Obtain a token from the identity endpoint
    async fn authenticate(&self, credentials: &Credentials) -> ClientResult<()>;

    /// HEAD a container
    async fn container(&self, container: &str) -> ClientResult<ContainerInfo>;

    /// PUT a container
    async fn container_create(&self, container: &str, headers: &Headers) -> ClientResult<()>;

    /// Open an object for ranged reading
    async fn object_open(&self, container: &str, name: &str)
        -> ClientResult<Box<dyn ObjectReader>>;

    /// Upload a whole object in one request
    async fn object_put_bytes(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> ClientResult<()>;

    /// HEAD an object
    async fn object(&self, container: &str, name: &str) -> ClientResult<ObjectInfo>;

    /// DELETE an object
    async fn object_delete(&self, container: &str, name: &str) -> ClientResult<()>;

    /// GET one page of object names
    async fn object_names(&self, container: &str, opts: &ListOpts) -> ClientResult<Vec<String>>;
}
