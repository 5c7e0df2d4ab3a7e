//! Testing utilities and fixtures for swift-backend
//!
//! This crate provides an instrumented client, ready-made backends over an
//! in-memory store, fixtures and assertions for testing code built on
//! `swift-backend`.

use anyhow::Result;
use std::sync::Arc;
use swift_backend::{Config, MemoryClient, NameStream, SwiftBackend};
use tracing_subscriber::EnvFilter;

pub mod assertions;
pub mod fixtures;
pub mod recording;

pub use recording::{Call, Op, RecordingClient};

/// A backend over a fresh in-memory store, with access to every layer
#[derive(Debug)]
pub struct TestBackend {
    /// The in-memory store
    pub memory: Arc<MemoryClient>,
    /// The recording wrapper the backend talks to
    pub client: RecordingClient,
    /// The backend under test
    pub backend: SwiftBackend,
}

impl TestBackend {
    /// Open a backend on `swift:///<container>/<prefix>` over an empty store
    pub async fn open(container: &str, prefix: &str) -> Result<Self> {
        Self::open_with(container, prefix, |client| client).await
    }

    /// Like [`TestBackend::open`], letting the caller configure the recording client
    pub async fn open_with<F>(container: &str, prefix: &str, configure: F) -> Result<Self>
    where
        F: FnOnce(RecordingClient) -> RecordingClient,
    {
        let config = Config::parse(&location(container, prefix))?;
        Self::from_config(config, configure).await
    }

    /// Open a backend for `config` over an empty store
    pub async fn from_config<F>(config: Config, configure: F) -> Result<Self>
    where
        F: FnOnce(RecordingClient) -> RecordingClient,
    {
        let memory = Arc::new(MemoryClient::new());
        let client = configure(RecordingClient::new(memory.clone()));

        let backend = SwiftBackend::open(config, Arc::new(client.clone())).await?;

        Ok(Self {
            memory,
            client,
            backend,
        })
    }

    /// Full remote key of an object, as stored in the memory client
    pub fn key(&self, file_type: swift_backend::FileType, name: &str) -> String {
        self.backend.object_key(file_type, name)
    }
}

/// Build a location string for `container` and `prefix`
pub fn location(container: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        format!("swift:///{}", container)
    } else {
        format!("swift:///{}/{}", container, prefix)
    }
}

/// Drain a listing, failing on the first error
pub async fn collect_names(mut names: NameStream) -> Result<Vec<String>> {
    let mut out = Vec::new();
    while let Some(name) = names.next_name().await {
        out.push(name?);
    }
    Ok(out)
}

/// Install a test subscriber honoring `RUST_LOG`; repeated calls are ignored
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
