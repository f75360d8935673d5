use std::sync::Arc;

use crate::{Preferences, StoreError, StoreConfiguration};

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// This trait represents the persistence backend of a single store, capable of reading and
/// replacing the whole snapshot.
///
/// Implementations do not need to synchronize concurrent writers: the
/// [`DataStore`](crate::DataStore) serializes all transactions on a store before calling
/// [`Storage::write`].
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Read the persisted snapshot. Returns an empty snapshot if nothing was ever written.
    ///
    /// I/O failures must be reported as [`StoreError::Read`] and undecodable data as
    /// [`StoreError::Corrupted`].
    async fn read(&self) -> Result<Preferences, StoreError>;

    /// Replace the persisted snapshot. Must be all-or-nothing.
    async fn write(&self, preferences: &Preferences) -> Result<(), StoreError>;
}

/// Build the storage backend for the store `name` described by `configuration`.
pub(crate) fn for_configuration(
    name: &str,
    configuration: &StoreConfiguration,
) -> Arc<dyn Storage> {
    match configuration {
        StoreConfiguration::Memory => Arc::new(MemoryStorage::new()),
        StoreConfiguration::File { folder_path } => {
            Arc::new(FileStorage::new(folder_path.join(format!(
                "{name}.{}",
                FileStorage::EXTENSION
            ))))
        }
    }
}
