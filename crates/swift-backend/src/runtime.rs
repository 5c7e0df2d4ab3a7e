//! Synchronous access to a [`SwiftBackend`]
//!
//! [`BlockingBackend`] drives the async backend on a shared Tokio runtime so callers
//! without an async context can use it. Its methods must not be called from inside
//! a Tokio runtime worker thread.

use crate::handle::{FileInfo, FileType, Handle};
use crate::list::NameStream;
use crate::{Error, Result, SwiftBackend};
use bytes::Bytes;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/// Get or create the shared runtime used by [`BlockingBackend`]
fn get_runtime() -> Result<Arc<Runtime>> {
    static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();

    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.clone());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("swift-backend-worker")
        .build()?;

    Ok(RUNTIME.get_or_init(|| Arc::new(runtime)).clone())
}

/// Blocking wrapper around a [`SwiftBackend`]
#[derive(Debug, Clone)]
pub struct BlockingBackend {
    inner: SwiftBackend,
    runtime: Arc<Runtime>,
}

impl BlockingBackend {
    /// Wrap `backend`, starting the shared runtime if necessary
    pub fn new(backend: SwiftBackend) -> Result<Self> {
        Ok(Self {
            inner: backend,
            runtime: get_runtime()?,
        })
    }

    /// Open a backend synchronously
    pub fn open(
        config: crate::Config,
        client: Arc<dyn crate::client::SwiftClient>,
    ) -> Result<Self> {
        let runtime = get_runtime()?;
        let inner = runtime.block_on(SwiftBackend::open(config, client))?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async backend
    pub fn inner(&self) -> &SwiftBackend {
        &self.inner
    }

    /// See [`SwiftBackend::location`]
    pub fn location(&self) -> &str {
        self.inner.location()
    }

    /// See [`SwiftBackend::load`]
    pub fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize> {
        self.runtime.block_on(self.inner.load(h, buf, offset))
    }

    /// See [`SwiftBackend::save`]
    pub fn save(&self, h: &Handle, data: impl Into<Bytes>) -> Result<()> {
        self.runtime.block_on(self.inner.save(h, data))
    }

    /// See [`SwiftBackend::stat`]
    pub fn stat(&self, h: &Handle) -> Result<FileInfo> {
        self.runtime.block_on(self.inner.stat(h))
    }

    /// See [`SwiftBackend::test`]
    pub fn test(&self, t: FileType, name: &str) -> Result<bool> {
        self.runtime.block_on(self.inner.test(t, name))
    }

    /// See [`SwiftBackend::remove`]
    pub fn remove(&self, t: FileType, name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.remove(t, name))
    }

    /// Iterate over the names of all objects of type `t`
    pub fn list(&self, t: FileType, cancel: CancellationToken) -> BlockingNames {
        let _guard = self.runtime.enter();
        BlockingNames {
            stream: self.inner.list(t, cancel),
        }
    }

    /// See [`SwiftBackend::delete`]
    pub fn delete(&self) -> Result<()> {
        self.runtime.block_on(self.inner.delete())
    }

    /// See [`SwiftBackend::close`]
    pub fn close(&self) -> Result<()> {
        self.runtime.block_on(self.inner.close())
    }
}

/// Blocking iterator over a [`NameStream`]
#[derive(Debug)]
pub struct BlockingNames {
    stream: NameStream,
}

impl BlockingNames {
    /// Stop the listing early
    pub fn cancel(&self) {
        self.stream.cancel();
    }

    /// Collect all names, failing on the first listing error
    pub fn collect_names(self) -> Result<Vec<String>> {
        self.collect::<std::result::Result<Vec<_>, Error>>()
    }
}

impl Iterator for BlockingNames {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.blocking_next()
    }
}
