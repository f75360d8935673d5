use tokio::sync::RwLock;

use super::Storage;
use crate::{Preferences, StoreError};

/// In-memory storage. Data lives as long as the storage value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<Preferences>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with `preferences`.
    pub fn with_data(preferences: Preferences) -> Self {
        Self {
            data: RwLock::new(preferences),
        }
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn read(&self) -> Result<Preferences, StoreError> {
        Ok(self.data.read().await.clone())
    }

    async fn write(&self, preferences: &Preferences) -> Result<(), StoreError> {
        *self.data.write().await = preferences.clone();
        Ok(())
    }
}
