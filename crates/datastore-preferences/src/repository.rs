//! Saving and retrieving user preferences.

use datastore::{
    CancellationToken, DataMigration, DataStore, LegacyPreferencesMigration, Preferences,
    StoreConfiguration, StoreError, Subscription,
};
use tracing::warn;

use crate::{
    user_preferences::{decode_sort_order, SHOW_COMPLETED, SORT_ORDER},
    PreferencesError, SortOrder, UserPreferences,
};

/// Name of the store holding the user preferences.
pub const USER_STORE_NAME: &str = "user";

/// Name of the legacy source imported into the user preferences store.
pub const LEGACY_PREFERENCES_NAME: &str = "user_preferences";

/// Handles saving and retrieving user preferences.
///
/// # Example
/// ```rust
/// use datastore::StoreConfiguration;
/// use datastore_preferences::{SortOrder, UserPreferencesRepository};
///
/// # tokio_test_runtime(async {
/// let repository = UserPreferencesRepository::initialize(&StoreConfiguration::Memory).await?;
///
/// repository.enable_sort_by_deadline(true).await?;
/// repository.update_show_completed(true).await?;
///
/// let preferences = repository.fetch_initial_preferences().await?;
/// assert!(preferences.show_completed);
/// assert_eq!(preferences.sort_order, SortOrder::ByDeadline);
/// # Ok::<_, datastore_preferences::PreferencesError>(())
/// # });
/// # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UserPreferencesRepository {
    store: DataStore,
}

impl UserPreferencesRepository {
    /// Create a repository over an already initialized store.
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// Open the [`USER_STORE_NAME`] store, importing the [`LEGACY_PREFERENCES_NAME`] legacy
    /// source the first time.
    pub async fn initialize(configuration: &StoreConfiguration) -> Result<Self, PreferencesError> {
        let migration: Box<dyn DataMigration> = Box::new(
            LegacyPreferencesMigration::for_configuration(LEGACY_PREFERENCES_NAME, configuration)?,
        );
        let store = DataStore::initialize(USER_STORE_NAME, configuration, vec![migration]).await?;
        Ok(Self::new(store))
    }

    /// The underlying store.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Observe the preferences: the current value first, then one value per change.
    pub fn observe_preferences(&self) -> UserPreferencesStream {
        UserPreferencesStream {
            subscription: self.store.data(),
            store: self.store.name().to_string(),
            finished: false,
        }
    }

    /// The current preferences.
    pub async fn fetch_initial_preferences(&self) -> Result<UserPreferences, PreferencesError> {
        self.observe_preferences()
            .next()
            .await
            .unwrap_or(Err(PreferencesError::Store(StoreError::Closed)))
    }

    /// Set whether completed tasks are shown. The sort order is left untouched.
    pub async fn update_show_completed(&self, show_completed: bool) -> Result<(), PreferencesError> {
        self.store
            .edit(|preferences| {
                preferences.set(&SHOW_COMPLETED, show_completed);
                Ok::<_, PreferencesError>(())
            })
            .await?;
        Ok(())
    }

    /// Turn sorting by deadline on or off, keeping sorting by priority as is.
    pub async fn enable_sort_by_deadline(&self, enable: bool) -> Result<(), PreferencesError> {
        self.update_sort_order(|current| current.with_deadline(enable))
            .await
    }

    /// Turn sorting by priority on or off, keeping sorting by deadline as is.
    pub async fn enable_sort_by_priority(&self, enable: bool) -> Result<(), PreferencesError> {
        self.update_sort_order(|current| current.with_priority(enable))
            .await
    }

    // The read and the write happen in one transaction, so concurrent updates from other
    // callers can't be lost.
    async fn update_sort_order(
        &self,
        update: impl FnOnce(SortOrder) -> SortOrder,
    ) -> Result<(), PreferencesError> {
        self.store
            .edit(|preferences| {
                let current = decode_sort_order(preferences.get(&SORT_ORDER)?)?;
                preferences.set(&SORT_ORDER, update(current).name().to_string());
                Ok::<_, PreferencesError>(())
            })
            .await?;
        Ok(())
    }
}

/// A stream of [`UserPreferences`], one value per observed store state.
///
/// A failed storage read is treated as "no data yet": the defaults are emitted and the stream
/// continues. Any other error is emitted once, after which the stream ends.
#[derive(Debug)]
pub struct UserPreferencesStream {
    subscription: Subscription,
    store: String,
    finished: bool,
}

impl UserPreferencesStream {
    /// Wait for the next value. Returns `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<UserPreferences, PreferencesError>> {
        if self.finished {
            return None;
        }
        let state = self.subscription.next().await;
        self.decode(state)
    }

    /// Like [`UserPreferencesStream::next`], but gives up with [`StoreError::Cancelled`] when
    /// `token` is cancelled first. Cancellation does not end the stream.
    pub async fn next_with_cancellation(
        &mut self,
        token: &CancellationToken,
    ) -> Option<Result<UserPreferences, PreferencesError>> {
        if self.finished {
            return None;
        }
        match self.subscription.next_with_cancellation(token).await {
            Some(Err(StoreError::Cancelled)) => Some(Err(StoreError::Cancelled.into())),
            state => self.decode(state),
        }
    }

    fn decode(
        &mut self,
        state: Option<Result<Preferences, StoreError>>,
    ) -> Option<Result<UserPreferences, PreferencesError>> {
        let preferences = match state {
            None => {
                self.finished = true;
                return None;
            }
            Some(Ok(preferences)) => preferences,
            Some(Err(e)) if e.is_read_fault() => {
                warn!(store = %self.store, error = %e, "Reading preferences failed, using defaults");
                Preferences::empty()
            }
            Some(Err(e)) => {
                self.finished = true;
                return Some(Err(e.into()));
            }
        };

        let decoded = UserPreferences::from_preferences(&preferences);
        if decoded.is_err() {
            self.finished = true;
        }
        Some(decoded)
    }
}
