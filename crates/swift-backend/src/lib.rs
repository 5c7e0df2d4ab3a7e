//! # swift-backend
//!
//! Storage backend for OpenStack Swift. Objects are addressed by a [`Handle`], a
//! (type, name) pair, and stored in one container below an optional prefix:
//! `prefix/Config` for the configuration object, `prefix/<type>/<name>` for
//! everything else.
//!
//! ## Architecture
//!
//! - [`Config`]: location parsing (`swift:///container/prefix`) and environment lookup
//! - [`SwiftClient`]: the primitive operations of a Swift connection; [`MemoryClient`]
//!   implements them in memory
//! - [`SwiftBackend`]: load/save/stat/test/remove/list/delete on top of a client, with
//!   a [`ConnectionPool`] bounding concurrent transfers
//! - [`BlockingBackend`]: the same operations for synchronous callers
//!
//! ```no_run
//! # async fn demo() -> swift_backend::Result<()> {
//! use std::sync::Arc;
//! use swift_backend::{Config, FileType, Handle, MemoryClient, SwiftBackend};
//!
//! let config = Config::resolve("swift:///backups/host1")?;
//! let be = SwiftBackend::open(config, Arc::new(MemoryClient::new())).await?;
//!
//! be.save(&Handle::new(FileType::Data, "abc123"), b"payload".to_vec()).await?;
//! assert!(be.test(FileType::Data, "abc123").await?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod backend;
pub mod client;
pub mod config;
mod error;
mod handle;
mod list;
mod memory;
pub mod path;
mod pool;
mod reader;
mod runtime;
mod writer;

pub use backend::{Backend, SwiftBackend};
pub use client::{ClientError, SwiftClient};
pub use config::{Config, Credentials};
pub use error::{Error, ParseError, Result};
pub use handle::{FileInfo, FileType, Handle};
pub use list::{NameStream, PAGE_SIZE};
pub use memory::MemoryClient;
pub use pool::{ConnectionPool, PoolSlot};
pub use reader::normalize_offset;
pub use runtime::{BlockingBackend, BlockingNames};
pub use writer::CONTENT_TYPE;

// Re-export the cancellation token accepted by `list`
pub use tokio_util::sync::CancellationToken;
