//! Paginated, cancellable listing and bulk deletion

use crate::client::{ListOpts, SwiftClient};
use crate::handle::FileType;
use crate::{path, Error, Result, SwiftBackend};
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Number of names requested per listing page
pub const PAGE_SIZE: usize = 1000;

/// Names of the objects of one type, produced by a background task.
///
/// Items arrive in the order the service lists them. A listing failure is delivered
/// as a final `Err` item. Dropping the stream stops the task just like cancelling
/// its token does, without cancelling the token the caller passed in.
#[derive(Debug)]
pub struct NameStream {
    rx: mpsc::Receiver<Result<String>>,
    cancel: CancellationToken,
}

impl NameStream {
    /// Receive the next name, `None` once the listing is complete or cancelled
    pub async fn next_name(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }

    /// Stop the background task; no further pages are requested
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block the current thread until the next name arrives; used by the blocking facade
    pub(crate) fn blocking_next(&mut self) -> Option<Result<String>> {
        self.rx.blocking_recv()
    }
}

impl Stream for NameStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for NameStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Lister {
    client: Arc<dyn SwiftClient>,
    container: String,
    prefix: String,
    tx: mpsc::Sender<Result<String>>,
    cancel: CancellationToken,
}

impl Lister {
    async fn run(self) {
        let mut opts = ListOpts {
            prefix: Some(self.prefix.clone()),
            marker: None,
            limit: Some(PAGE_SIZE),
        };

        loop {
            let page = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    trace!("listing {} cancelled", self.prefix);
                    return;
                }
                page = self.client.object_names(&self.container, &opts) => page,
            };

            let names = match page {
                Ok(names) => names,
                Err(e) => {
                    warn!("listing {} failed: {}", self.prefix, e);
                    let err = Error::from_client("conn.ObjectNames", &self.prefix, e);
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {}
                        _ = self.tx.send(Err(err)) => {}
                    }
                    return;
                }
            };

            // a page may hold fewer names than the limit; only an empty one ends the walk
            let Some(last) = names.last().cloned() else {
                return;
            };

            for obj in names {
                let name = match obj.strip_prefix(self.prefix.as_str()) {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => continue,
                };

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return,
                    sent = self.tx.send(Ok(name)) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
            }

            opts.marker = Some(last);
        }
    }
}

impl SwiftBackend {
    /// Start listing the names of all objects of type `t`.
    ///
    /// The names have the type prefix stripped. Must be called from within a tokio
    /// runtime; the listing runs on its own task until it is exhausted, fails, or
    /// `cancel` fires.
    pub fn list(&self, t: FileType, cancel: CancellationToken) -> NameStream {
        let prefix = path::type_prefix(&self.prefix, t);
        debug!("listing {} ({})", t, prefix);

        let cancel = cancel.child_token();
        let (tx, rx) = mpsc::channel(1);
        let lister = Lister {
            client: self.client.clone(),
            container: self.container.clone(),
            prefix,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(lister.run());

        NameStream { rx, cancel }
    }

    async fn remove_keys(&self, t: FileType) -> Result<()> {
        let mut names = self.list(t, CancellationToken::new());

        while let Some(name) = names.next().await {
            self.remove(t, &name?).await?;
        }

        Ok(())
    }

    /// Remove every object of every type, then the config object.
    ///
    /// Types are emptied in the order of [`FileType::NAMED`]. The first failure aborts
    /// the whole operation and is returned; objects removed until then stay removed.
    /// The container itself is kept.
    pub async fn delete(&self) -> Result<()> {
        for t in FileType::NAMED {
            debug!("removing all {} objects", t);
            self.remove_keys(t).await?;
        }

        self.remove(FileType::Config, "").await
    }
}
