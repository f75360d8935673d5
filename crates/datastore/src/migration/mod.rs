//! One-time data migrations run before a store publishes its first snapshot.

use crate::{Preferences, StoreError};

mod legacy;

pub use legacy::{
    FileLegacyPreferences, LegacyPreferences, LegacyPreferencesMigration,
    MemoryLegacyPreferences,
};

/// A transformation applied to a store's data the first time it is loaded.
///
/// Migrations run under the store's transaction lock, in registration order. The result of all
/// migrations is persisted before [`DataMigration::clean_up`] is called on any of them, so a
/// failed write never loses the migrated data.
#[async_trait::async_trait]
pub trait DataMigration: Send + Sync {
    /// Whether this migration has anything to do for the `current` data.
    async fn should_migrate(&self, current: &Preferences) -> Result<bool, StoreError>;

    /// Produce the migrated data.
    async fn migrate(&self, current: Preferences) -> Result<Preferences, StoreError>;

    /// Remove the migration source once the migrated data has been persisted.
    async fn clean_up(&self) -> Result<(), StoreError>;
}

/// Apply every pending migration to `data`.
///
/// Returns the migrated data and the indices of the migrations that ran.
pub(crate) async fn apply(
    migrations: &[Box<dyn DataMigration>],
    mut data: Preferences,
) -> Result<(Preferences, Vec<usize>), StoreError> {
    let mut applied = Vec::new();
    for (index, migration) in migrations.iter().enumerate() {
        if migration.should_migrate(&data).await? {
            data = migration.migrate(data).await?;
            applied.push(index);
        }
    }
    Ok((data, applied))
}
