//! Object identifiers

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    /// The single repository configuration object
    Config,
    /// Pack files
    Data,
    /// Key files
    Key,
    /// Lock files
    Lock,
    /// Snapshot files
    Snapshot,
    /// Index files
    Index,
}

impl FileType {
    /// Categories holding named objects, in the order a bulk delete walks them
    pub const NAMED: [FileType; 5] = [
        FileType::Data,
        FileType::Key,
        FileType::Lock,
        FileType::Snapshot,
        FileType::Index,
    ];

    /// Path segment used for this category in remote keys
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Config => "Config",
            FileType::Data => "Data",
            FileType::Key => "Key",
            FileType::Lock => "Lock",
            FileType::Snapshot => "Snapshot",
            FileType::Index => "Index",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (type, name) pair identifying a logical object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Object category
    pub file_type: FileType,
    /// Object name, empty for the config object
    pub name: String,
}

impl Handle {
    /// Create a handle
    pub fn new(file_type: FileType, name: impl Into<String>) -> Self {
        Self {
            file_type,
            name: name.into(),
        }
    }

    /// Handle of the configuration object
    pub fn config() -> Self {
        Self::new(FileType::Config, "")
    }

    /// Check that the handle addresses exactly one object.
    ///
    /// Every category except [`FileType::Config`] needs a non-empty name, otherwise
    /// the remote key would collapse onto the category prefix itself.
    pub fn valid(&self) -> Result<()> {
        if self.file_type == FileType::Config {
            return Ok(());
        }

        if self.name.is_empty() {
            return Err(Error::InvalidHandle(format!(
                "{} handle without a name",
                self.file_type
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "<{}>", self.file_type)
        } else {
            write!(f, "<{}/{}>", self.file_type, self.name)
        }
    }
}

/// Information returned by a stat call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    /// Size in bytes
    pub size: u64,
}
