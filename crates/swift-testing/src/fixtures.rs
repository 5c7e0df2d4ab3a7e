//! Common test fixtures for swift-backend testing

use anyhow::Result;
use swift_backend::{FileType, Handle, SwiftBackend};

/// Deterministic payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// A content-address style object name derived from `i`
pub fn object_name(i: usize) -> String {
    format!("{:064x}", i)
}

/// Save `count` objects of `file_type`, each `size` bytes, returning their names
pub async fn seed_objects(
    backend: &SwiftBackend,
    file_type: FileType,
    count: usize,
    size: usize,
) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(count);
    for i in 0..count {
        let name = object_name(i);
        backend
            .save(&Handle::new(file_type, name.as_str()), payload(size))
            .await?;
        names.push(name);
    }
    Ok(names)
}

/// Save a small object of every type plus the config object
pub async fn seed_repository(backend: &SwiftBackend, per_type: usize) -> Result<()> {
    backend.save(&Handle::config(), payload(16)).await?;
    for file_type in FileType::NAMED {
        seed_objects(backend, file_type, per_type, 8).await?;
    }
    Ok(())
}
