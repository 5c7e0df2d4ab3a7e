//! The Swift backend instance and its metadata operations

use crate::client::{ClientError, Headers, SwiftClient};
use crate::handle::{FileInfo, FileType, Handle};
use crate::list::NameStream;
use crate::path;
use crate::pool::ConnectionPool;
use crate::{Config, Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Header carrying the storage policy of a new container
const STORAGE_POLICY_HEADER: &str = "X-Storage-Policy";

/// Content-addressed object storage as seen by the backup engine
#[async_trait]
pub trait Backend: Send + Sync {
    /// Where the objects live
    fn location(&self) -> &str;

    /// Read `buf.len()` bytes of `h` starting at `offset`; negative offsets count from the end
    async fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize>;

    /// Store `data` under `h`, refusing to overwrite
    async fn save(&self, h: &Handle, data: Bytes) -> Result<()>;

    /// Size of the object behind `h`
    async fn stat(&self, h: &Handle) -> Result<FileInfo>;

    /// Whether the object `(t, name)` exists
    async fn test(&self, t: FileType, name: &str) -> Result<bool>;

    /// Remove the object `(t, name)`
    async fn remove(&self, t: FileType, name: &str) -> Result<()>;

    /// Stream the names of all objects of type `t`
    fn list(&self, t: FileType, cancel: CancellationToken) -> NameStream;

    /// Remove every object of every type, then the config object
    async fn delete(&self) -> Result<()>;

    /// Release the backend
    async fn close(&self) -> Result<()>;
}

/// A backend storing objects in one Swift container below a prefix
#[derive(Clone)]
pub struct SwiftBackend {
    pub(crate) client: Arc<dyn SwiftClient>,
    pub(crate) pool: ConnectionPool,
    pub(crate) container: String,
    pub(crate) prefix: String,
}

impl fmt::Debug for SwiftBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftBackend")
            .field("container", &self.container)
            .field("prefix", &self.prefix)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl SwiftBackend {
    /// Open the backend described by `config` through `client`.
    ///
    /// Authenticates unless a storage URL and token are configured, then makes sure
    /// the container exists, creating it with the configured storage policy if needed.
    pub async fn open(config: Config, client: Arc<dyn SwiftClient>) -> Result<Self> {
        config.validate()?;

        let credentials = config.credentials();
        if credentials.is_preauthenticated() {
            debug!("using pre-authenticated storage url {}", credentials.storage_url);
            client.use_token(&credentials.storage_url, &credentials.auth_token);
        } else if !client.is_authenticated() {
            debug!("authenticating against {}", credentials.auth_url);
            client
                .authenticate(&credentials)
                .await
                .map_err(|source| Error::AuthenticationFailed { source })?;
        }

        let be = Self {
            client,
            pool: ConnectionPool::new(config.connections),
            container: config.container,
            prefix: config.prefix,
        };

        match be.client.container(&be.container).await {
            Ok(_) => debug!("container {} exists", be.container),
            Err(ClientError::ContainerNotFound) => {
                be.create_container(&config.default_container_policy).await?
            }
            Err(e) => return Err(Error::from_client("conn.Container", &be.container, e)),
        }

        Ok(be)
    }

    async fn create_container(&self, policy: &str) -> Result<()> {
        let mut headers = Headers::new();
        if !policy.is_empty() {
            headers.insert(STORAGE_POLICY_HEADER.to_string(), policy.to_string());
        }

        info!("creating container {} (policy {:?})", self.container, policy);
        self.client
            .container_create(&self.container, &headers)
            .await
            .map_err(|source| Error::ContainerCreateFailed {
                container: self.container.clone(),
                source,
            })
    }

    /// The container name
    pub fn location(&self) -> &str {
        &self.container
    }

    /// The prefix all object keys are placed under
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The transfer slot pool shared by loads and saves
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Remote key of the object `(t, name)`
    pub fn object_key(&self, t: FileType, name: &str) -> String {
        path::object_key(&self.prefix, t, name)
    }

    /// Size of the object behind `h`
    pub async fn stat(&self, h: &Handle) -> Result<FileInfo> {
        h.valid()?;
        debug!("stat {}", h);

        let key = self.object_key(h.file_type, &h.name);
        let obj = self
            .client
            .object(&self.container, &key)
            .await
            .map_err(|e| Error::from_client("conn.Object", &key, e))?;

        Ok(FileInfo { size: obj.bytes })
    }

    /// Whether the object `(t, name)` exists. A missing object is not an error.
    pub async fn test(&self, t: FileType, name: &str) -> Result<bool> {
        Handle::new(t, name).valid()?;

        let key = self.object_key(t, name);
        match self.client.object(&self.container, &key).await {
            Ok(_) => Ok(true),
            Err(ClientError::ObjectNotFound) => Ok(false),
            Err(e) => Err(Error::from_client("conn.Object", &key, e)),
        }
    }

    /// Remove the object `(t, name)`. Removing a missing object fails with `NotFound`.
    pub async fn remove(&self, t: FileType, name: &str) -> Result<()> {
        Handle::new(t, name).valid()?;

        let key = self.object_key(t, name);
        let result = self.client.object_delete(&self.container, &key).await;
        debug!("remove {} -> {:?}", key, result);
        result.map_err(|e| Error::from_client("conn.ObjectDelete", &key, e))
    }

    /// Nothing to release; every operation returns its resources itself
    pub async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Backend for SwiftBackend {
    fn location(&self) -> &str {
        SwiftBackend::location(self)
    }

    async fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize> {
        SwiftBackend::load(self, h, buf, offset).await
    }

    async fn save(&self, h: &Handle, data: Bytes) -> Result<()> {
        SwiftBackend::save(self, h, data).await
    }

    async fn stat(&self, h: &Handle) -> Result<FileInfo> {
        SwiftBackend::stat(self, h).await
    }

    async fn test(&self, t: FileType, name: &str) -> Result<bool> {
        SwiftBackend::test(self, t, name).await
    }

    async fn remove(&self, t: FileType, name: &str) -> Result<()> {
        SwiftBackend::remove(self, t, name).await
    }

    fn list(&self, t: FileType, cancel: CancellationToken) -> NameStream {
        SwiftBackend::list(self, t, cancel)
    }

    async fn delete(&self) -> Result<()> {
        SwiftBackend::delete(self).await
    }

    async fn close(&self) -> Result<()> {
        SwiftBackend::close(self).await
    }
}
