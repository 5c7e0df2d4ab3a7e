//! A client wrapper that records calls and injects failures

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use swift_backend::client::{
    ClientError, ClientResult, ContainerInfo, Headers, ListOpts, ObjectInfo, ObjectReader,
};
use swift_backend::{Credentials, SwiftClient};

/// Client operations that can be counted or made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Credential authentication, target is the user name
    Authenticate,
    /// Container HEAD
    Container,
    /// Container PUT
    ContainerCreate,
    /// Opening an object for reading
    ObjectOpen,
    /// Length query on an open object
    ObjectLength,
    /// One read from an open object
    ObjectRead,
    /// Closing an open object
    ObjectClose,
    /// Upload
    ObjectPut,
    /// Object HEAD
    Object,
    /// Object DELETE
    ObjectDelete,
    /// One listing page, target is the name prefix
    ObjectNames,
}

/// One recorded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Which operation ran
    pub op: Op,
    /// Container or object name it addressed
    pub target: String,
}

#[derive(Debug, Clone)]
struct Fault {
    op: Op,
    target: Option<String>,
    error: ClientError,
    skip: usize,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    faults: Mutex<Vec<Fault>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn record(&self, op: Op, target: &str) -> ClientResult<()> {
        lock(&self.calls).push(Call {
            op,
            target: target.to_string(),
        });

        let mut faults = lock(&self.faults);
        let hit = faults.iter_mut().position(|f| {
            f.op == op && f.target.as_deref().map_or(true, |t| t == target)
        });

        if let Some(idx) = hit {
            if faults[idx].skip > 0 {
                faults[idx].skip -= 1;
                return Ok(());
            }
            let error = faults[idx].error.clone();
            if let Some(remaining) = faults[idx].remaining.as_mut() {
                *remaining -= 1;
                if *remaining == 0 {
                    faults.remove(idx);
                }
            }
            return Err(error);
        }
        Ok(())
    }

    fn begin_transfer(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn end_transfer(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Wraps another [`SwiftClient`], logging every request.
///
/// Failures can be injected per operation and target, transfers can be slowed down
/// to hold pool slots, and the peak number of concurrent transfers is tracked.
#[derive(Clone)]
pub struct RecordingClient {
    inner: Arc<dyn SwiftClient>,
    shared: Arc<Shared>,
    transfer_delay: Option<Duration>,
    page_delay: Option<Duration>,
    page_limit: Option<usize>,
}

impl std::fmt::Debug for RecordingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingClient")
            .field("shared", &self.shared)
            .field("transfer_delay", &self.transfer_delay)
            .field("page_delay", &self.page_delay)
            .field("page_limit", &self.page_limit)
            .finish_non_exhaustive()
    }
}

impl RecordingClient {
    /// Wrap `inner`
    pub fn new(inner: Arc<dyn SwiftClient>) -> Self {
        Self {
            inner,
            shared: Arc::new(Shared::default()),
            transfer_delay: None,
            page_delay: None,
            page_limit: None,
        }
    }

    /// Sleep this long inside every upload and every object read
    pub fn with_transfer_delay(mut self, delay: Duration) -> Self {
        self.transfer_delay = Some(delay);
        self
    }

    /// Sleep this long before answering every listing page
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = Some(delay);
        self
    }

    /// Answer listing pages with at most `limit` names, whatever the caller asked for
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = Some(limit);
        self
    }

    /// Fail every `op` call addressing `target` (any target if `None`)
    pub fn fail(&self, op: Op, target: Option<&str>, error: ClientError) {
        self.push_fault(op, target, error, 0, None);
    }

    /// Fail the next `times` calls of `op` addressing `target`
    pub fn fail_times(&self, op: Op, target: Option<&str>, error: ClientError, times: usize) {
        if times > 0 {
            self.push_fault(op, target, error, 0, Some(times));
        }
    }

    /// Let the next `skip` calls of `op` addressing `target` through, then fail every one
    pub fn fail_after(&self, op: Op, target: Option<&str>, error: ClientError, skip: usize) {
        self.push_fault(op, target, error, skip, None);
    }

    fn push_fault(
        &self,
        op: Op,
        target: Option<&str>,
        error: ClientError,
        skip: usize,
        remaining: Option<usize>,
    ) {
        lock(&self.shared.faults).push(Fault {
            op,
            target: target.map(str::to_string),
            error,
            skip,
            remaining,
        });
    }

    /// All recorded calls in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.shared.calls).clone()
    }

    /// Number of recorded calls of `op`
    pub fn count(&self, op: Op) -> usize {
        lock(&self.shared.calls).iter().filter(|c| c.op == op).count()
    }

    /// Targets of the recorded calls of `op`, in order
    pub fn targets(&self, op: Op) -> Vec<String> {
        lock(&self.shared.calls)
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.target.clone())
            .collect()
    }

    /// Forget recorded calls, keep injected failures
    pub fn clear_calls(&self) {
        lock(&self.shared.calls).clear();
    }

    /// Peak number of uploads and open objects at the same time
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    /// Uploads and open objects right now
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SwiftClient for RecordingClient {
    fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    fn use_token(&self, storage_url: &str, auth_token: &str) {
        self.inner.use_token(storage_url, auth_token)
    }

    async fn authenticate(&self, credentials: &Credentials) -> ClientResult<()> {
        self.shared.record(Op::Authenticate, &credentials.user_name)?;
        self.inner.authenticate(credentials).await
    }

    async fn container(&self, container: &str) -> ClientResult<ContainerInfo> {
        self.shared.record(Op::Container, container)?;
        self.inner.container(container).await
    }

    async fn container_create(&self, container: &str, headers: &Headers) -> ClientResult<()> {
        self.shared.record(Op::ContainerCreate, container)?;
        self.inner.container_create(container, headers).await
    }

    async fn object_open(
        &self,
        container: &str,
        name: &str,
    ) -> ClientResult<Box<dyn ObjectReader>> {
        self.shared.record(Op::ObjectOpen, name)?;
        let reader = self.inner.object_open(container, name).await?;

        self.shared.begin_transfer();
        Ok(Box::new(RecordingReader {
            inner: Some(reader),
            name: name.to_string(),
            shared: self.shared.clone(),
            delay: self.transfer_delay,
        }))
    }

    async fn object_put_bytes(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> ClientResult<()> {
        self.shared.record(Op::ObjectPut, name)?;

        self.shared.begin_transfer();
        if let Some(delay) = self.transfer_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self
            .inner
            .object_put_bytes(container, name, data, content_type)
            .await;
        self.shared.end_transfer();
        result
    }

    async fn object(&self, container: &str, name: &str) -> ClientResult<ObjectInfo> {
        self.shared.record(Op::Object, name)?;
        self.inner.object(container, name).await
    }

    async fn object_delete(&self, container: &str, name: &str) -> ClientResult<()> {
        self.shared.record(Op::ObjectDelete, name)?;
        self.inner.object_delete(container, name).await
    }

    async fn object_names(&self, container: &str, opts: &ListOpts) -> ClientResult<Vec<String>> {
        self.shared
            .record(Op::ObjectNames, opts.prefix.as_deref().unwrap_or(""))?;
        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }
        match self.page_limit {
            Some(cap) => {
                let capped = ListOpts {
                    limit: Some(opts.limit.map_or(cap, |l| l.min(cap))),
                    ..opts.clone()
                };
                self.inner.object_names(container, &capped).await
            }
            None => self.inner.object_names(container, opts).await,
        }
    }
}

struct RecordingReader {
    inner: Option<Box<dyn ObjectReader>>,
    name: String,
    shared: Arc<Shared>,
    delay: Option<Duration>,
}

impl RecordingReader {
    fn reader(&mut self) -> ClientResult<&mut Box<dyn ObjectReader>> {
        self.inner
            .as_mut()
            .ok_or_else(|| ClientError::Transport("reader already closed".to_string()))
    }
}

impl Drop for RecordingReader {
    fn drop(&mut self) {
        if self.inner.is_some() {
            self.shared.end_transfer();
        }
    }
}

#[async_trait]
impl ObjectReader for RecordingReader {
    async fn length(&mut self) -> ClientResult<u64> {
        self.shared.record(Op::ObjectLength, &self.name)?;
        self.reader()?.length().await
    }

    async fn seek(&mut self, offset: u64) -> ClientResult<u64> {
        self.reader()?.seek(offset).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> ClientResult<usize> {
        self.shared.record(Op::ObjectRead, &self.name)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reader()?.read(buf).await
    }

    async fn close(mut self: Box<Self>) -> ClientResult<()> {
        let closed = match self.inner.take() {
            Some(reader) => {
                self.shared.end_transfer();
                reader.close().await
            }
            None => Ok(()),
        };
        self.shared.record(Op::ObjectClose, &self.name)?;
        closed
    }
}
