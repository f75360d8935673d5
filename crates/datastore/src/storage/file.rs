use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::Storage;
use crate::{Preferences, StoreError};

/// Stores one JSON document per store.
///
/// Writes go to a sibling temporary file which is then renamed over the target, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// File extension used for store files.
    pub const EXTENSION: &'static str = "preferences.json";

    #[allow(missing_docs)]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[allow(missing_docs)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    async fn read(&self) -> Result<Preferences, StoreError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Preferences::empty()),
            Err(e) => return Err(StoreError::read(e)),
        };

        Ok(serde_json::from_slice(&contents)?)
    }

    async fn write(&self, preferences: &Preferences) -> Result<(), StoreError> {
        let contents = serde_json::to_vec_pretty(preferences)
            .map_err(|e| StoreError::write(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::write)?;
        }

        let scratch = self.scratch_path();
        tokio::fs::write(&scratch, contents)
            .await
            .map_err(StoreError::write)?;

        if let Err(e) = tokio::fs::rename(&scratch, &self.path).await {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(StoreError::write(e));
        }

        Ok(())
    }
}
