//! Ranged reads of remote objects

use crate::client::{ClientResult, ObjectReader};
use crate::{Error, Handle, Result, SwiftBackend};
use tracing::{debug, trace};

/// Turn a possibly negative offset into a position from the start of an object of
/// `length` bytes. Negative offsets count back from the end; reaching back further
/// than the object is long starts at 0. Positive offsets are returned unchanged,
/// even past the end.
pub fn normalize_offset(offset: i64, length: u64) -> u64 {
    if offset >= 0 {
        return offset as u64;
    }

    let magnitude = offset.unsigned_abs();
    if magnitude > length {
        0
    } else {
        length - magnitude
    }
}

impl SwiftBackend {
    /// Read the object behind `h` starting at `offset` into `buf`.
    ///
    /// A negative `offset` is taken relative to the end of the object. Starting past
    /// the end fails with [`Error::EndOfFile`]. If the object ends before `buf` is
    /// full, the available bytes are copied and [`Error::UnexpectedEndOfFile`] reports
    /// how many were delivered.
    pub async fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize> {
        h.valid()?;
        debug!("load {}, offset {}, len {}", h, offset, buf.len());

        let key = self.object_key(h.file_type, &h.name);
        let _slot = self.pool.acquire().await?;

        let mut obj = self
            .client
            .object_open(&self.container, &key)
            .await
            .map_err(|e| {
                debug!("  open {} failed: {}", key, e);
                Error::from_client("conn.ObjectOpen", &key, e)
            })?;

        let result = read_range(obj.as_mut(), &key, buf, offset).await;

        // the close error only surfaces when nothing failed before
        let closed = obj.close().await;
        match (result, closed) {
            (Ok(_), Err(e)) => Err(Error::from_client("obj.Close", &key, e)),
            (result, _) => result,
        }
    }
}

async fn read_range(
    obj: &mut dyn ObjectReader,
    key: &str,
    buf: &mut [u8],
    offset: i64,
) -> Result<usize> {
    let length = obj
        .length()
        .await
        .map_err(|e| Error::from_client("obj.Length", key, e))?;

    let off = normalize_offset(offset, length);
    if off > length {
        return Err(Error::EndOfFile {
            key: key.to_string(),
            offset: off,
            length,
        });
    }

    let requested = buf.len();
    let remaining = length - off;
    let mut short = false;
    let buf = if requested as u64 > remaining {
        trace!("    capped buffer to {} bytes", remaining);
        short = true;
        &mut buf[..remaining as usize]
    } else {
        buf
    };

    obj.seek(off)
        .await
        .map_err(|e| Error::from_client("obj.Seek", key, e))?;

    let n = read_full(obj, buf)
        .await
        .map_err(|e| Error::from_client("obj.Read", key, e))?;

    if n < buf.len() {
        // the stream ended before the length it advertised
        if n == 0 {
            return Err(Error::EndOfFile {
                key: key.to_string(),
                offset: off,
                length,
            });
        }
        return Err(Error::UnexpectedEndOfFile {
            key: key.to_string(),
            read: n,
            requested,
        });
    }

    if short {
        return Err(Error::UnexpectedEndOfFile {
            key: key.to_string(),
            read: n,
            requested,
        });
    }

    Ok(n)
}

/// Read until `buf` is full or the stream is exhausted
async fn read_full(obj: &mut dyn ObjectReader, buf: &mut [u8]) -> ClientResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = obj.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
