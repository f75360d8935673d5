#![doc = include_str!("../README.md")]

mod configuration;
mod error;
mod key;
pub mod migration;
mod preferences;
pub mod storage;
mod store;
mod subscription;
mod value;

pub use configuration::{validate_store_name, StoreConfiguration};
pub use error::StoreError;
pub use key::Key;
pub use migration::{
    DataMigration, FileLegacyPreferences, LegacyPreferences, LegacyPreferencesMigration,
    MemoryLegacyPreferences,
};
pub use preferences::{MutablePreferences, Preferences};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::DataStore;
pub use subscription::Subscription;
pub use value::{PreferenceType, PreferenceValue};

/// Re-exported so callers can cancel waits without depending on `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
