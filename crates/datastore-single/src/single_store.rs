use datastore::{
    DataMigration, DataStore, Key, LegacyPreferencesMigration, PreferenceType, Preferences,
    StoreConfiguration, StoreError, Subscription,
};
use tracing::warn;

use crate::SingleStoreError;

/// A store holding a single value of type `T`.
#[async_trait::async_trait]
pub trait SingleStore<T: Send + 'static>: Send + Sync {
    /// Observe the value: the current one first, then one per change.
    fn data(&self) -> ValueStream<T>;

    /// The current value.
    async fn get_value(&self) -> Result<T, SingleStoreError>;

    /// Replace the value.
    async fn set_value(&self, value: T) -> Result<(), SingleStoreError>;
}

/// A [`SingleStore`] backed by its own [`DataStore`]. The value is stored under a key named
/// after the store.
///
/// # Example
/// ```rust
/// use datastore::StoreConfiguration;
/// use datastore_single::{SingleDataStore, SingleStore, SingleStoreError};
///
/// # tokio_test_runtime(async {
/// let counter = SingleDataStore::<i32>::initialize("counter", None, &StoreConfiguration::Memory)
///     .await?;
///
/// assert!(matches!(
///     counter.get_value().await,
///     Err(SingleStoreError::MissingDefault { .. })
/// ));
///
/// counter.set_value(3).await?;
/// assert_eq!(counter.get_value().await?, 3);
/// # Ok::<_, SingleStoreError>(())
/// # });
/// # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SingleDataStore<T> {
    store: DataStore,
    key: Key<T>,
}

impl<T: PreferenceType> SingleDataStore<T> {
    /// Open the store `name`.
    ///
    /// If `migration_name` is given, the entry called `name` of the legacy source of that name
    /// is imported the first time the store is opened. Other entries stay in the source.
    pub async fn initialize(
        name: &str,
        migration_name: Option<&str>,
        configuration: &StoreConfiguration,
    ) -> Result<Self, SingleStoreError> {
        let mut migrations: Vec<Box<dyn DataMigration>> = Vec::new();
        if let Some(migration_name) = migration_name {
            let source =
                LegacyPreferencesMigration::source_for_configuration(migration_name, configuration)?;
            migrations.push(Box::new(LegacyPreferencesMigration::with_keys(
                source,
                [name],
            )));
        }

        let store = DataStore::initialize(name, configuration, migrations).await?;
        Ok(Self::from_store(store))
    }

    /// Use an already initialized store. The value is stored under the store's name.
    pub fn from_store(store: DataStore) -> Self {
        let key = Key::owned(store.name());
        Self { store, key }
    }

    /// The underlying store.
    pub fn store(&self) -> &DataStore {
        &self.store
    }
}

#[async_trait::async_trait]
impl<T: PreferenceType> SingleStore<T> for SingleDataStore<T> {
    fn data(&self) -> ValueStream<T> {
        ValueStream {
            subscription: self.store.data(),
            key: self.key.clone(),
            finished: false,
        }
    }

    async fn get_value(&self) -> Result<T, SingleStoreError> {
        self.data()
            .next()
            .await
            .unwrap_or(Err(SingleStoreError::Store(StoreError::Closed)))
    }

    async fn set_value(&self, value: T) -> Result<(), SingleStoreError> {
        let key = &self.key;
        self.store
            .edit(|preferences| {
                preferences.set(key, value);
                Ok::<_, SingleStoreError>(())
            })
            .await?;
        Ok(())
    }
}

/// A stream of the value held by a [`SingleDataStore`].
///
/// If the store holds no value the stream yields [`SingleStoreError::MissingDefault`] and ends.
/// A failed storage read counts as an empty store. Any other error also ends the stream.
#[derive(Debug)]
pub struct ValueStream<T> {
    subscription: Subscription,
    key: Key<T>,
    finished: bool,
}

impl<T: PreferenceType> ValueStream<T> {
    /// Wait for the next value. Returns `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<T, SingleStoreError>> {
        if self.finished {
            return None;
        }

        let preferences = match self.subscription.next().await {
            None => {
                self.finished = true;
                return None;
            }
            Some(Ok(preferences)) => preferences,
            Some(Err(e)) if e.is_read_fault() => {
                warn!(store = %self.key.name(), error = %e, "Reading value failed, treating store as empty");
                Preferences::empty()
            }
            Some(Err(e)) => {
                self.finished = true;
                return Some(Err(e.into()));
            }
        };

        let value = match preferences.get(&self.key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(SingleStoreError::MissingDefault {
                name: self.key.name().to_string(),
            }),
            Err(e) => Err(e.into()),
        };
        if value.is_err() {
            self.finished = true;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use datastore::PreferenceValue;
    use datastore_test::{FaultyStorage, LegacyFolder};

    use super::*;

    async fn memory_store<T: PreferenceType>(name: &str) -> SingleDataStore<T> {
        SingleDataStore::initialize(name, None, &StoreConfiguration::Memory)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_before_set_fails_with_missing_default() {
        let store = memory_store::<String>("username").await;

        let err = store.get_value().await.unwrap_err();
        assert!(matches!(
            err,
            SingleStoreError::MissingDefault { name } if name == "username"
        ));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = memory_store::<i64>("last_sync").await;

        store.set_value(1_700_000_000).await.unwrap();
        assert_eq!(store.get_value().await.unwrap(), 1_700_000_000);

        store.set_value(1_800_000_000).await.unwrap();
        assert_eq!(store.get_value().await.unwrap(), 1_800_000_000);
    }

    #[tokio::test]
    async fn test_data_observes_changes() {
        let store = memory_store::<bool>("onboarded").await;
        store.set_value(false).await.unwrap();

        let mut data = store.data();
        assert!(!data.next().await.unwrap().unwrap());

        store.set_value(true).await.unwrap();
        assert!(data.next().await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_missing_value_ends_stream() {
        let store = memory_store::<f64>("ratio").await;
        let mut data = store.data();

        assert!(matches!(
            data.next().await,
            Some(Err(SingleStoreError::MissingDefault { .. }))
        ));
        assert!(data.next().await.is_none());
    }

    #[tokio::test]
    async fn test_read_fault_is_treated_as_empty() {
        let storage = Arc::new(FaultyStorage::new());
        storage.fail_next_reads(1);
        let store = DataStore::with_storage("counter", storage, Vec::new())
            .await
            .unwrap();
        let counter = SingleDataStore::<i32>::from_store(store);

        assert!(matches!(
            counter.get_value().await,
            Err(SingleStoreError::MissingDefault { .. })
        ));

        counter.set_value(1).await.unwrap();
        assert_eq!(counter.get_value().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_store_error() {
        let store = DataStore::initialize("counter", &StoreConfiguration::Memory, Vec::new())
            .await
            .unwrap();
        store
            .edit(|preferences| {
                preferences.set_raw("counter", PreferenceValue::String("three".into()));
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap();

        let counter = SingleDataStore::<i32>::from_store(store);
        assert!(matches!(
            counter.get_value().await,
            Err(SingleStoreError::Store(StoreError::TypeMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let store: Box<dyn SingleStore<String>> = Box::new(memory_store::<String>("theme").await);

        store.set_value("dark".to_string()).await.unwrap();
        assert_eq!(store.get_value().await.unwrap(), "dark");
    }

    #[tokio::test]
    async fn test_closed_store() {
        let store = memory_store::<i32>("counter").await;
        store.store().shutdown().await;

        assert!(matches!(
            store.get_value().await,
            Err(SingleStoreError::Store(StoreError::Closed))
        ));
        assert!(matches!(
            store.set_value(1).await,
            Err(SingleStoreError::Store(StoreError::Closed))
        ));
    }

    #[tokio::test]
    async fn test_legacy_import_is_one_time() {
        let folder = LegacyFolder::new().unwrap();
        folder
            .write_legacy("settings", serde_json::json!({ "counter": 5, "other": true }))
            .unwrap();

        let counter = SingleDataStore::<i32>::initialize(
            "counter",
            Some("settings"),
            &folder.configuration(),
        )
        .await
        .unwrap();
        assert_eq!(counter.get_value().await.unwrap(), 5);
        assert_eq!(counter.store().data().first().await.unwrap().unwrap().len(), 1);

        let remaining: serde_json::Value =
            serde_json::from_slice(&std::fs::read(folder.legacy_path("settings")).unwrap())
                .unwrap();
        assert_eq!(remaining, serde_json::json!({ "other": true }));

        counter.set_value(6).await.unwrap();
        counter.store().shutdown().await;

        let reopened = SingleDataStore::<i32>::initialize(
            "counter",
            Some("settings"),
            &folder.configuration(),
        )
        .await
        .unwrap();
        assert_eq!(reopened.get_value().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_unparsable_legacy_source_does_not_block_writes() {
        let folder = LegacyFolder::new().unwrap();
        std::fs::write(folder.legacy_path("settings"), b"{ not json").unwrap();

        let counter = SingleDataStore::<i32>::initialize(
            "counter",
            Some("settings"),
            &folder.configuration(),
        )
        .await
        .unwrap();
        assert!(matches!(
            counter.get_value().await,
            Err(SingleStoreError::MissingDefault { .. })
        ));

        counter.set_value(1).await.unwrap();
        counter.set_value(2).await.unwrap();
        assert_eq!(counter.get_value().await.unwrap(), 2);
        assert!(folder.legacy_path("settings").exists());
    }

    #[tokio::test]
    async fn test_non_finite_value_is_rejected() {
        let folder = LegacyFolder::new().unwrap();
        let ratio =
            SingleDataStore::<f64>::initialize("ratio", None, &folder.configuration())
                .await
                .unwrap();

        assert!(matches!(
            ratio.set_value(f64::NAN).await,
            Err(SingleStoreError::Store(StoreError::InvalidValue { .. }))
        ));
        ratio.store().shutdown().await;

        let reopened =
            SingleDataStore::<f64>::initialize("ratio", None, &folder.configuration())
                .await
                .unwrap();
        assert!(matches!(
            reopened.get_value().await,
            Err(SingleStoreError::MissingDefault { .. })
        ));
        reopened.set_value(1.0).await.unwrap();
        assert_eq!(reopened.get_value().await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_without_legacy_source_stays_empty() {
        let folder = LegacyFolder::new().unwrap();

        let counter = SingleDataStore::<i32>::initialize(
            "counter",
            Some("settings"),
            &folder.configuration(),
        )
        .await
        .unwrap();

        assert!(matches!(
            counter.get_value().await,
            Err(SingleStoreError::MissingDefault { .. })
        ));
    }
}
