use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use datastore::{MemoryStorage, Preferences, Storage, StoreError};

/// In-memory [`Storage`] with injectable faults.
///
/// Reads can be made to fail a number of times with an I/O error, after which they succeed
/// again. Writes can be made to fail until re-enabled.
#[derive(Debug, Default)]
pub struct FaultyStorage {
    data: MemoryStorage,
    read_faults: AtomicUsize,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl FaultyStorage {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `preferences`.
    pub fn with_data(preferences: Preferences) -> Self {
        Self {
            data: MemoryStorage::with_data(preferences),
            ..Self::default()
        }
    }

    /// Make the next `count` reads fail with [`StoreError::Read`].
    pub fn fail_next_reads(&self, count: usize) {
        self.read_faults.store(count, Ordering::SeqCst);
    }

    /// Make writes fail with [`StoreError::Write`] until called again with `false`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of read attempts, failed ones included.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Storage for FaultyStorage {
    async fn read(&self) -> Result<Preferences, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .read_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Read(std::sync::Arc::new(std::io::Error::other(
                "injected read fault",
            ))));
        }

        self.data.read().await
    }

    async fn write(&self, preferences: &Preferences) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write(std::sync::Arc::new(std::io::Error::other(
                "injected write fault",
            ))));
        }

        self.data.write(preferences).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
