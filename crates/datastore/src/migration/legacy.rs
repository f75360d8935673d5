use std::{
    collections::{BTreeMap, BTreeSet},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::DataMigration;
use crate::{
    configuration::validate_store_name, PreferenceValue, Preferences, StoreConfiguration,
    StoreError,
};

/// A flat, legacy key-value source that data is imported from once.
#[async_trait::async_trait]
pub trait LegacyPreferences: Send + Sync {
    /// Load every recognized entry. A source that does not exist is empty.
    async fn load(&self) -> Result<BTreeMap<String, PreferenceValue>, StoreError>;

    /// Delete the given keys from the source. Deleting the last key deletes the source.
    async fn remove_keys(&self, keys: &[String]) -> Result<(), StoreError>;
}

/// A legacy source held in memory.
#[derive(Debug, Default)]
pub struct MemoryLegacyPreferences {
    values: Mutex<BTreeMap<String, PreferenceValue>>,
}

impl MemoryLegacyPreferences {
    #[allow(missing_docs)]
    pub fn new(values: BTreeMap<String, PreferenceValue>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    /// The entries still held by the source.
    pub async fn values(&self) -> BTreeMap<String, PreferenceValue> {
        self.values.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl LegacyPreferences for MemoryLegacyPreferences {
    async fn load(&self) -> Result<BTreeMap<String, PreferenceValue>, StoreError> {
        Ok(self.values.lock().await.clone())
    }

    async fn remove_keys(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        for key in keys {
            values.remove(key);
        }
        Ok(())
    }
}

/// A legacy source stored as a flat JSON object, `{"key": value, ...}`.
///
/// JSON values are mapped as: boolean to `Bool`, integers that fit to `Int`, other integers to
/// `Long`, other numbers to `Double`, strings to `String` and arrays of strings to
/// `StringSet`. Anything else is skipped. A file that is not a JSON object loads as empty and
/// is left untouched.
#[derive(Debug, Clone)]
pub struct FileLegacyPreferences {
    path: PathBuf,
}

impl FileLegacyPreferences {
    #[allow(missing_docs)]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The legacy source called `name` inside `folder_path`.
    pub fn in_folder(folder_path: &Path, name: &str) -> Self {
        Self::new(folder_path.join(format!("{name}.json")))
    }

    async fn read_raw(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(contents) => Ok(serde_json::from_slice(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(e) => Err(StoreError::read(e)),
        }
    }
}

#[async_trait::async_trait]
impl LegacyPreferences for FileLegacyPreferences {
    async fn load(&self) -> Result<BTreeMap<String, PreferenceValue>, StoreError> {
        let raw = match self.read_raw().await {
            Ok(raw) => raw,
            Err(e @ StoreError::Corrupted(_)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable legacy preferences"
                );
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e),
        };

        let mut values = BTreeMap::new();
        for (key, value) in raw {
            match legacy_value(&value) {
                Some(value) => {
                    values.insert(key, value);
                }
                None => warn!(
                    path = %self.path.display(),
                    key = %key,
                    "Skipping legacy preference with unsupported value"
                ),
            }
        }
        Ok(values)
    }

    async fn remove_keys(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut raw = self.read_raw().await?;
        for key in keys {
            raw.remove(key);
        }

        if raw.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(StoreError::write(e)),
                _ => Ok(()),
            };
        }

        let contents = serde_json::to_vec_pretty(&raw)?;
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(StoreError::write)
    }
}

fn legacy_value(value: &serde_json::Value) -> Option<PreferenceValue> {
    use serde_json::Value;

    match value {
        Value::Bool(b) => Some(PreferenceValue::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(match i32::try_from(i) {
                Ok(i) => PreferenceValue::Int(i),
                Err(_) => PreferenceValue::Long(i),
            }),
            None => n.as_f64().map(PreferenceValue::Double),
        },
        Value::String(s) => Some(PreferenceValue::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<BTreeSet<_>>>()
            .map(PreferenceValue::StringSet),
        Value::Null | Value::Object(_) => None,
    }
}

/// Imports entries from a [`LegacyPreferences`] source into a store.
///
/// Entries already present in the store are kept. Imported entries are removed from the legacy
/// source afterwards, so once the import succeeded it never runs again.
pub struct LegacyPreferencesMigration {
    source: Arc<dyn LegacyPreferences>,
    keys: Option<BTreeSet<String>>,
}

impl LegacyPreferencesMigration {
    /// Import every entry of `source`.
    pub fn new(source: Arc<dyn LegacyPreferences>) -> Self {
        Self { source, keys: None }
    }

    /// Import only the listed keys of `source`.
    pub fn with_keys(
        source: Arc<dyn LegacyPreferences>,
        keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            source,
            keys: Some(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Import every entry of the legacy source called `name` under `configuration`.
    ///
    /// In-memory configurations have no legacy data, the returned migration never runs.
    pub fn for_configuration(
        name: &str,
        configuration: &StoreConfiguration,
    ) -> Result<Self, StoreError> {
        Ok(Self::new(Self::source_for_configuration(name, configuration)?))
    }

    /// The legacy source called `name` under `configuration`.
    pub fn source_for_configuration(
        name: &str,
        configuration: &StoreConfiguration,
    ) -> Result<Arc<dyn LegacyPreferences>, StoreError> {
        validate_store_name(name)?;

        Ok(match configuration {
            StoreConfiguration::Memory => Arc::new(MemoryLegacyPreferences::default()),
            StoreConfiguration::File { folder_path } => {
                Arc::new(FileLegacyPreferences::in_folder(folder_path, name))
            }
        })
    }

    async fn load_selected(&self) -> Result<BTreeMap<String, PreferenceValue>, StoreError> {
        let mut values = self.source.load().await?;
        if let Some(keys) = &self.keys {
            values.retain(|key, _| keys.contains(key));
        }
        Ok(values)
    }
}

#[async_trait::async_trait]
impl DataMigration for LegacyPreferencesMigration {
    async fn should_migrate(&self, _current: &Preferences) -> Result<bool, StoreError> {
        Ok(!self.load_selected().await?.is_empty())
    }

    async fn migrate(&self, current: Preferences) -> Result<Preferences, StoreError> {
        let mut data = current.to_mutable();
        let mut imported = 0usize;
        for (key, value) in self.load_selected().await? {
            if !data.contains_name(&key) {
                data.set_raw(key, value);
                imported += 1;
            }
        }

        info!(imported, "Imported legacy preferences");
        Ok(data.freeze())
    }

    async fn clean_up(&self) -> Result<(), StoreError> {
        let keys: Vec<String> = self.load_selected().await?.into_keys().collect();
        self.source.remove_keys(&keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;

    #[test]
    fn test_legacy_value_mapping() {
        use serde_json::json;

        assert_eq!(legacy_value(&json!(true)), Some(PreferenceValue::Bool(true)));
        assert_eq!(legacy_value(&json!(42)), Some(PreferenceValue::Int(42)));
        assert_eq!(
            legacy_value(&json!(5_000_000_000i64)),
            Some(PreferenceValue::Long(5_000_000_000))
        );
        assert_eq!(legacy_value(&json!(1.5)), Some(PreferenceValue::Double(1.5)));
        assert_eq!(
            legacy_value(&json!(["b", "a"])),
            Some(PreferenceValue::StringSet(
                ["a".to_string(), "b".to_string()].into()
            ))
        );
        assert_eq!(legacy_value(&json!(["a", 1])), None);
        assert_eq!(legacy_value(&json!(null)), None);
        assert_eq!(legacy_value(&json!({ "nested": 1 })), None);
    }

    #[tokio::test]
    async fn test_existing_keys_are_kept() {
        let source = Arc::new(MemoryLegacyPreferences::new(BTreeMap::from([
            ("show_completed".to_string(), PreferenceValue::Bool(true)),
            ("sort_order".to_string(), PreferenceValue::String("BY_PRIORITY".into())),
        ])));
        let migration = LegacyPreferencesMigration::new(source.clone());

        let mut current = Preferences::empty().to_mutable();
        current.set(&Key::<bool>::new("show_completed"), false);
        let current = current.freeze();

        assert!(migration.should_migrate(&current).await.unwrap());
        let migrated = migration.migrate(current).await.unwrap();
        assert_eq!(
            migrated.get(&Key::<bool>::new("show_completed")).unwrap(),
            Some(false)
        );
        assert_eq!(
            migrated.get(&Key::<String>::new("sort_order")).unwrap(),
            Some("BY_PRIORITY".to_string())
        );

        migration.clean_up().await.unwrap();
        assert!(source.values().await.is_empty());
        assert!(!migration.should_migrate(&migrated).await.unwrap());
    }

    #[tokio::test]
    async fn test_selected_keys_only() {
        let source = Arc::new(MemoryLegacyPreferences::new(BTreeMap::from([
            ("wanted".to_string(), PreferenceValue::Int(1)),
            ("unrelated".to_string(), PreferenceValue::Int(2)),
        ])));
        let migration = LegacyPreferencesMigration::with_keys(source.clone(), ["wanted"]);

        let migrated = migration.migrate(Preferences::empty()).await.unwrap();
        assert_eq!(migrated.len(), 1);

        migration.clean_up().await.unwrap();
        assert_eq!(
            source.values().await,
            BTreeMap::from([("unrelated".to_string(), PreferenceValue::Int(2))])
        );
    }

    #[tokio::test]
    async fn test_file_source_is_deleted_once_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileLegacyPreferences::in_folder(dir.path(), "user_preferences");
        std::fs::write(
            dir.path().join("user_preferences.json"),
            br#"{ "show_completed": true, "ignored": null }"#,
        )
        .unwrap();

        let loaded = source.load().await.unwrap();
        assert_eq!(
            loaded,
            BTreeMap::from([("show_completed".to_string(), PreferenceValue::Bool(true))])
        );

        source
            .remove_keys(&["show_completed".to_string(), "ignored".to_string()])
            .await
            .unwrap();
        assert!(!dir.path().join("user_preferences.json").exists());
        assert!(source.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_file_source_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let source = Arc::new(FileLegacyPreferences::new(&path));

        assert!(source.load().await.unwrap().is_empty());
        let migration = LegacyPreferencesMigration::new(source);
        assert!(!migration.should_migrate(&Preferences::empty()).await.unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
    }

    #[tokio::test]
    async fn test_memory_configuration_never_migrates() {
        let migration = LegacyPreferencesMigration::for_configuration(
            "user_preferences",
            &StoreConfiguration::Memory,
        )
        .unwrap();
        assert!(!migration.should_migrate(&Preferences::empty()).await.unwrap());
    }
}
