//! In-process Swift client
//!
//! [`MemoryClient`] keeps containers and objects in ordered maps and behaves like a
//! Swift endpoint for everything the backend uses: token or credential
//! authentication, container HEAD/PUT, ranged object reads, uploads, deletes and
//! prefix/marker/limit name listings in lexical order.

use crate::client::{
    ClientError, ClientResult, ContainerInfo, Headers, ListOpts, ObjectInfo, ObjectReader,
    SwiftClient,
};
use crate::config::Credentials;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

#[derive(Debug, Default)]
struct StoredContainer {
    headers: Headers,
    objects: BTreeMap<String, StoredObject>,
}

/// A [`SwiftClient`] backed by process memory
#[derive(Debug, Default)]
pub struct MemoryClient {
    containers: Mutex<BTreeMap<String, StoredContainer>>,
    authenticated: AtomicBool,
    token: std::sync::Mutex<Option<(String, String)>>,
    accept: Option<(String, String)>,
}

impl MemoryClient {
    /// A client accepting any credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// A client only accepting `user_name` with `api_key`
    pub fn with_account(user_name: &str, api_key: &str) -> Self {
        Self {
            accept: Some((user_name.to_string(), api_key.to_string())),
            ..Self::default()
        }
    }

    /// Create `container` up front
    pub async fn create_container(&self, container: &str) {
        self.containers
            .lock()
            .await
            .entry(container.to_string())
            .or_default();
    }

    /// Headers the container was created with, if it exists
    pub async fn container_headers(&self, container: &str) -> Option<Headers> {
        self.containers
            .lock()
            .await
            .get(container)
            .map(|c| c.headers.clone())
    }

    /// All object names in `container`
    pub async fn object_keys(&self, container: &str) -> Vec<String> {
        self.containers
            .lock()
            .await
            .get(container)
            .map(|c| c.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Contents of an object, bypassing the request path
    pub async fn object_data(&self, container: &str, name: &str) -> Option<Bytes> {
        self.containers
            .lock()
            .await
            .get(container)
            .and_then(|c| c.objects.get(name))
            .map(|o| o.data.clone())
    }

    /// The storage URL and token set through [`SwiftClient::use_token`]
    pub fn token(&self) -> Option<(String, String)> {
        self.token.lock().ok().and_then(|t| t.clone())
    }
}

#[async_trait]
impl SwiftClient for MemoryClient {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn use_token(&self, storage_url: &str, auth_token: &str) {
        if let Ok(mut token) = self.token.lock() {
            *token = Some((storage_url.to_string(), auth_token.to_string()));
        }
        self.authenticated.store(true, Ordering::SeqCst);
    }

    async fn authenticate(&self, credentials: &Credentials) -> ClientResult<()> {
        if let Some((user, key)) = &self.accept {
            if credentials.user_name != *user || credentials.api_key != *key {
                return Err(ClientError::Unauthorized(format!(
                    "bad credentials for user {:?}",
                    credentials.user_name
                )));
            }
        }
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn container(&self, container: &str) -> ClientResult<ContainerInfo> {
        let containers = self.containers.lock().await;
        let c = containers
            .get(container)
            .ok_or(ClientError::ContainerNotFound)?;

        Ok(ContainerInfo {
            name: container.to_string(),
            count: c.objects.len() as u64,
            bytes: c.objects.values().map(|o| o.data.len() as u64).sum(),
        })
    }

    async fn container_create(&self, container: &str, headers: &Headers) -> ClientResult<()> {
        let mut containers = self.containers.lock().await;
        let c = containers.entry(container.to_string()).or_default();
        c.headers.extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn object_open(
        &self,
        container: &str,
        name: &str,
    ) -> ClientResult<Box<dyn ObjectReader>> {
        let containers = self.containers.lock().await;
        let obj = containers
            .get(container)
            .ok_or(ClientError::ContainerNotFound)?
            .objects
            .get(name)
            .ok_or(ClientError::ObjectNotFound)?;

        Ok(Box::new(MemoryReader {
            data: obj.data.clone(),
            position: 0,
        }))
    }

    async fn object_put_bytes(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> ClientResult<()> {
        let mut containers = self.containers.lock().await;
        let c = containers
            .get_mut(container)
            .ok_or(ClientError::ContainerNotFound)?;

        trace!("memory put {}/{} ({} bytes)", container, name, data.len());
        c.objects.insert(
            name.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn object(&self, container: &str, name: &str) -> ClientResult<ObjectInfo> {
        let containers = self.containers.lock().await;
        let obj = containers
            .get(container)
            .ok_or(ClientError::ContainerNotFound)?
            .objects
            .get(name)
            .ok_or(ClientError::ObjectNotFound)?;

        Ok(ObjectInfo {
            name: name.to_string(),
            bytes: obj.data.len() as u64,
            content_type: obj.content_type.clone(),
        })
    }

    async fn object_delete(&self, container: &str, name: &str) -> ClientResult<()> {
        let mut containers = self.containers.lock().await;
        containers
            .get_mut(container)
            .ok_or(ClientError::ContainerNotFound)?
            .objects
            .remove(name)
            .map(|_| ())
            .ok_or(ClientError::ObjectNotFound)
    }

    async fn object_names(&self, container: &str, opts: &ListOpts) -> ClientResult<Vec<String>> {
        let containers = self.containers.lock().await;
        let c = containers
            .get(container)
            .ok_or(ClientError::ContainerNotFound)?;

        let prefix = opts.prefix.as_deref().unwrap_or("");
        let limit = opts.limit.unwrap_or(usize::MAX);

        let names = c
            .objects
            .keys()
            .filter(|name| match &opts.marker {
                Some(marker) => name.as_str() > marker.as_str(),
                None => true,
            })
            .filter(|name| name.starts_with(prefix))
            .take(limit)
            .cloned()
            .collect();

        Ok(names)
    }
}

/// Reader over a snapshot of an object's contents
#[derive(Debug)]
struct MemoryReader {
    data: Bytes,
    position: usize,
}

#[async_trait]
impl ObjectReader for MemoryReader {
    async fn length(&mut self) -> ClientResult<u64> {
        Ok(self.data.len() as u64)
    }

    async fn seek(&mut self, offset: u64) -> ClientResult<u64> {
        self.position = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        Ok(self.position as u64)
    }

    async fn read(&mut self, buf: &mut [u8]) -> ClientResult<usize> {
        let available = &self.data[self.position..];
        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }

    async fn close(self: Box<Self>) -> ClientResult<()> {
        Ok(())
    }
}
