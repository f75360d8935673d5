use datastore::StoreError;
use thiserror::Error;

/// Errors that can occur when working with user preferences.
#[derive(Debug, Clone, Error)]
pub enum PreferencesError {
    /// Store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The stored sort order is not one of the known names
    #[error("Unknown sort order '{0}'")]
    UnknownSortOrder(String),
}
