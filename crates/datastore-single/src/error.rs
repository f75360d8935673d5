use datastore::StoreError;
use thiserror::Error;

#[allow(missing_docs)]
#[derive(Debug, Clone, Error)]
pub enum SingleStoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store holds no value. Callers must write a value before reading it.
    #[error("Store '{name}' has no value and no default")]
    MissingDefault { name: String },
}
