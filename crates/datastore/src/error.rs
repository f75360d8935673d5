use std::sync::Arc;

use thiserror::Error;

/// An error resulting from operations on a [`DataStore`](crate::DataStore).
///
/// The error is `Clone` so the current state of a store, including a failed read, can be
/// delivered to every subscriber. Underlying sources are shared through an [`Arc`].
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Reading the stored data failed at the I/O level.
    #[error("Failed to read preferences: {0}")]
    Read(#[source] Arc<std::io::Error>),

    /// The stored data could not be decoded.
    #[error("Preferences data is corrupted: {0}")]
    Corrupted(#[source] Arc<serde_json::Error>),

    /// Persisting a transaction failed. The committed state is unchanged.
    #[error("Failed to write preferences: {0}")]
    Write(#[source] Arc<std::io::Error>),

    /// A key holds a value of a different kind than the one requested.
    #[error("Preference '{key}' holds a {found} value, expected {expected}")]
    TypeMismatch {
        /// Name of the offending key.
        key: String,
        /// Kind requested by the caller.
        expected: &'static str,
        /// Kind found in storage.
        found: &'static str,
    },

    /// A value cannot be persisted, such as a NaN or infinite number.
    #[error("Preference '{key}' holds a non-finite {kind} value")]
    InvalidValue {
        /// Name of the offending key.
        key: String,
        /// Kind of the value.
        kind: &'static str,
    },

    /// The store name cannot be used as a storage identifier.
    #[error("Invalid store name '{0}': only ASCII letters, digits, '_' and '-' are allowed")]
    InvalidName(String),

    /// A data migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The operation was cancelled before it was applied.
    #[error("Operation was cancelled")]
    Cancelled,

    /// The store has been shut down.
    #[error("Store has been shut down")]
    Closed,
}

impl StoreError {
    /// Returns `true` for storage read failures.
    ///
    /// Consumers treat these as "no data yet" and substitute an empty snapshot instead of
    /// ending their stream.
    pub fn is_read_fault(&self) -> bool {
        matches!(self, StoreError::Read(_) | StoreError::Corrupted(_))
    }

    pub(crate) fn read(error: std::io::Error) -> Self {
        StoreError::Read(Arc::new(error))
    }

    pub(crate) fn write(error: std::io::Error) -> Self {
        StoreError::Write(Arc::new(error))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Corrupted(Arc::new(error))
    }
}
