use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Configuration for the storage backing preferences stores.
///
/// Deserializable so applications can embed it in their own configuration files:
///
/// ```rust
/// use datastore::StoreConfiguration;
///
/// let configuration: StoreConfiguration =
///     serde_json::from_str(r#"{ "kind": "file", "folder_path": "/data/datastore" }"#).unwrap();
/// assert!(matches!(configuration, StoreConfiguration::File { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfiguration {
    /// Volatile storage, one independent map per store handle. Used by tests and embedders.
    Memory,

    /// JSON files, one per store.
    File {
        /// The folder containing the store files. Legacy sources are looked up in the same
        /// folder.
        folder_path: PathBuf,
    },
}

/// Validate that the provided name can be used as a storage identifier.
///
/// Names become file names, so they are limited to ASCII letters, digits, `_` and `-`.
pub fn validate_store_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
