use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    configuration::validate_store_name,
    migration::{self, DataMigration},
    storage::{self, Storage},
    subscription::State,
    MutablePreferences, Preferences, StoreConfiguration, StoreError, Subscription,
};

/// A handle to a named preferences store.
///
/// Handles are cheap to clone and share the same underlying state. All mutations go through
/// [`DataStore::edit`], which applies transactions one at a time in a total order per store,
/// each one observing the result of the previous one.
///
/// # Example
/// ```rust
/// use datastore::{preference_key, DataStore, StoreConfiguration, StoreError};
///
/// preference_key!(const SHOW_COMPLETED: bool = "show_completed");
///
/// # tokio_test_runtime(async {
/// let store = DataStore::initialize("user", &StoreConfiguration::Memory, Vec::new()).await?;
/// let mut data = store.data();
///
/// store
///     .edit(|prefs| {
///         prefs.set(&SHOW_COMPLETED, true);
///         Ok::<_, StoreError>(())
///     })
///     .await?;
///
/// let current = data.next().await.expect("store is open")?;
/// assert_eq!(current.get(&SHOW_COMPLETED)?, Some(true));
///
/// store.shutdown().await;
/// # Ok::<_, StoreError>(())
/// # });
/// # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct DataStore {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    storage: Arc<dyn Storage>,
    state: watch::Sender<State>,
    transaction: Mutex<TransactionState>,
}

struct TransactionState {
    /// Migrations that have not completed yet.
    migrations: Vec<Box<dyn DataMigration>>,
    /// The last committed snapshot, `None` while the store is faulted.
    committed: Option<Preferences>,
    closed: bool,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("name", &self.inner.name)
            .finish()
    }
}

impl DataStore {
    /// Open the store `name` using the configured storage backend.
    ///
    /// The initial load (read and migrations) happens before this returns. A failed load does
    /// not fail initialization: the error becomes the store's current state, delivered to
    /// subscribers, and the next transaction or [`DataStore::reload`] retries it.
    pub async fn initialize(
        name: &str,
        configuration: &StoreConfiguration,
        migrations: Vec<Box<dyn DataMigration>>,
    ) -> Result<Self, StoreError> {
        validate_store_name(name)?;
        let storage = storage::for_configuration(name, configuration);
        Self::with_storage(name, storage, migrations).await
    }

    /// Open the store `name` over a caller-supplied storage backend.
    pub async fn with_storage(
        name: impl Into<String>,
        storage: Arc<dyn Storage>,
        migrations: Vec<Box<dyn DataMigration>>,
    ) -> Result<Self, StoreError> {
        let name = name.into();
        validate_store_name(&name)?;

        let (state, _) = watch::channel(Ok(Preferences::empty()));
        let store = DataStore {
            inner: Arc::new(Inner {
                name,
                storage,
                state,
                transaction: Mutex::new(TransactionState {
                    migrations,
                    committed: None,
                    closed: false,
                }),
            }),
        };

        {
            let mut transaction = store.inner.transaction.lock().await;
            // Failures are published as the current state.
            let _ = store.refresh(&mut transaction).await;
        }

        Ok(store)
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Subscribe to the store's state, starting with the current one.
    pub fn data(&self) -> Subscription {
        Subscription::new(self.inner.state.subscribe())
    }

    /// Atomically read, modify and write the store.
    ///
    /// `transform` receives an editable copy of the last committed snapshot. If it returns an
    /// error, or persisting the result fails, nothing is committed and the error is returned.
    /// A transaction that changes nothing is not written. Returns the committed snapshot.
    ///
    /// If the store is faulted, the data is read again first; a failed read is returned to the
    /// caller.
    pub async fn edit<F, E>(&self, transform: F) -> Result<Preferences, E>
    where
        F: FnOnce(&mut MutablePreferences) -> Result<(), E>,
        E: From<StoreError>,
    {
        let transaction = self.inner.transaction.lock().await;
        self.commit(transaction, transform, None).await
    }

    /// Like [`DataStore::edit`], abandoning the transaction with [`StoreError::Cancelled`] if
    /// `token` is cancelled while waiting for earlier transactions or before the write starts.
    /// Once the write has started the transaction runs to completion.
    pub async fn edit_with_cancellation<F, E>(
        &self,
        token: &CancellationToken,
        transform: F,
    ) -> Result<Preferences, E>
    where
        F: FnOnce(&mut MutablePreferences) -> Result<(), E>,
        E: From<StoreError>,
    {
        let transaction = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(StoreError::Cancelled.into()),
            transaction = self.inner.transaction.lock() => transaction,
        };
        self.commit(transaction, transform, Some(token)).await
    }

    /// Read the storage again, running any pending migrations, and publish the result.
    pub async fn reload(&self) -> Result<Preferences, StoreError> {
        let mut transaction = self.inner.transaction.lock().await;
        if transaction.closed {
            return Err(StoreError::Closed);
        }
        self.refresh(&mut transaction).await
    }

    /// Close the store. Waits for the running transaction, then ends every subscription.
    /// Later transactions fail with [`StoreError::Closed`]. Calling this again does nothing.
    pub async fn shutdown(&self) {
        let mut transaction = self.inner.transaction.lock().await;
        if transaction.closed {
            return;
        }

        transaction.closed = true;
        transaction.committed = None;
        self.inner.state.send_replace(Err(StoreError::Closed));
        info!(store = %self.inner.name, "Store shut down");
    }

    async fn commit<F, E>(
        &self,
        mut transaction: MutexGuard<'_, TransactionState>,
        transform: F,
        token: Option<&CancellationToken>,
    ) -> Result<Preferences, E>
    where
        F: FnOnce(&mut MutablePreferences) -> Result<(), E>,
        E: From<StoreError>,
    {
        if transaction.closed {
            return Err(StoreError::Closed.into());
        }

        let current = match transaction.committed.clone() {
            Some(current) => current,
            None => self.refresh(&mut transaction).await?,
        };

        let mut editable = current.to_mutable();
        transform(&mut editable)?;
        let updated = editable.freeze();
        updated.validate()?;

        if updated == current {
            return Ok(current);
        }

        if token.is_some_and(CancellationToken::is_cancelled) {
            return Err(StoreError::Cancelled.into());
        }

        self.inner.storage.write(&updated).await?;

        transaction.committed = Some(updated.clone());
        self.inner.state.send_replace(Ok(updated.clone()));
        debug!(store = %self.inner.name, keys = updated.len(), "Committed transaction");

        Ok(updated)
    }

    /// Load the data and publish it, or publish the failure.
    async fn refresh(&self, transaction: &mut TransactionState) -> Result<Preferences, StoreError> {
        match self.load(transaction).await {
            Ok(data) => {
                debug!(store = %self.inner.name, keys = data.len(), "Loaded preferences");
                transaction.committed = Some(data.clone());
                self.inner.state.send_replace(Ok(data.clone()));
                Ok(data)
            }
            Err(e) => {
                warn!(store = %self.inner.name, error = %e, "Failed to load preferences");
                transaction.committed = None;
                self.inner.state.send_replace(Err(e.clone()));
                Err(e)
            }
        }
    }

    async fn load(&self, transaction: &mut TransactionState) -> Result<Preferences, StoreError> {
        let data = self.inner.storage.read().await?;
        if transaction.migrations.is_empty() {
            return Ok(data);
        }

        let (migrated, applied) = migration::apply(&transaction.migrations, data.clone()).await?;
        if !applied.is_empty() {
            if migrated != data {
                self.inner.storage.write(&migrated).await?;
            }
            for index in &applied {
                transaction.migrations[*index].clean_up().await?;
            }
            info!(
                store = %self.inner.name,
                migrations = applied.len(),
                "Applied data migrations"
            );
        }

        transaction.migrations.clear();
        Ok(migrated)
    }
}
