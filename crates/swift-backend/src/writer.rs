//! Single-shot uploads

use crate::client::ClientError;
use crate::{Error, Handle, Result, SwiftBackend};
use bytes::Bytes;
use tracing::debug;

/// Content type recorded for every uploaded object
pub const CONTENT_TYPE: &str = "binary/octet-stream";

impl SwiftBackend {
    /// Store `data` under `h`.
    ///
    /// Fails with [`Error::AlreadyExists`] if the key is already present. The check and
    /// the upload are separate requests, so two concurrent saves of the same handle can
    /// both pass the check.
    pub async fn save(&self, h: &Handle, data: impl Into<Bytes>) -> Result<()> {
        h.valid()?;
        let data = data.into();
        debug!("save {} with {} bytes", h, data.len());

        let key = self.object_key(h.file_type, &h.name);

        match self.client.object(&self.container, &key).await {
            Ok(_) => {
                debug!("{} already exists", h);
                return Err(Error::AlreadyExists { key });
            }
            Err(ClientError::ObjectNotFound) => {}
            Err(e) => return Err(Error::from_client("conn.Object", &key, e)),
        }

        let _slot = self.pool.acquire().await?;

        let len = data.len();
        debug!(
            "PutObject({}, {}, {}, {})",
            self.container, key, len, CONTENT_TYPE
        );
        let result = self
            .client
            .object_put_bytes(&self.container, &key, data, CONTENT_TYPE)
            .await;
        debug!("{} -> {} bytes, err {:?}", key, len, result.as_ref().err());

        result.map_err(|e| Error::from_client("client.PutObject", &key, e))
    }
}
