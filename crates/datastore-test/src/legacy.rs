use std::path::PathBuf;

use datastore::StoreConfiguration;
use tempfile::TempDir;

/// A temporary folder usable as a file-backed [`StoreConfiguration`], with helpers to seed
/// legacy sources.
///
/// The folder is deleted when the value is dropped.
pub struct LegacyFolder {
    dir: TempDir,
}

impl LegacyFolder {
    /// Create an empty folder.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// A file-backed configuration rooted in this folder.
    pub fn configuration(&self) -> StoreConfiguration {
        StoreConfiguration::File {
            folder_path: self.dir.path().to_path_buf(),
        }
    }

    /// Write the legacy source `name` as a flat JSON object.
    pub fn write_legacy(&self, name: &str, values: serde_json::Value) -> std::io::Result<()> {
        std::fs::write(self.legacy_path(name), values.to_string())
    }

    /// Location of the legacy source `name`.
    pub fn legacy_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.json"))
    }

    /// Location of the store file `name`.
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.dir
            .path()
            .join(format!("{name}.{}", datastore::FileStorage::EXTENSION))
    }
}
