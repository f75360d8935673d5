//! Snapshots of a preferences store.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{Key, PreferenceType, PreferenceValue, StoreError};

/// An immutable, point-in-time view of every key in a store.
///
/// Snapshots are cheap to clone and are never observed mid-transaction. Absent keys are
/// "unset"; callers decide on a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    values: Arc<BTreeMap<String, PreferenceValue>>,
}

impl Preferences {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a typed value.
    ///
    /// Returns `Ok(None)` if the key is not set, and [`StoreError::TypeMismatch`] if it holds a
    /// value of another kind.
    pub fn get<T: PreferenceType>(&self, key: &Key<T>) -> Result<Option<T>, StoreError> {
        typed_lookup(&self.values, key)
    }

    /// Returns `true` if the key is set, regardless of its kind.
    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.values.contains_key(key.name())
    }

    /// Raw access by name.
    pub fn get_raw(&self, name: &str) -> Option<&PreferenceValue> {
        self.values.get(name)
    }

    /// Iterate over all stored entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PreferenceValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that every value can be persisted.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self.values.iter().find(|(_, value)| !value.is_finite()) {
            Some((key, value)) => Err(StoreError::InvalidValue {
                key: key.clone(),
                kind: value.kind(),
            }),
            None => Ok(()),
        }
    }

    /// Create an editable copy of this snapshot.
    pub fn to_mutable(&self) -> MutablePreferences {
        MutablePreferences {
            values: self.values.as_ref().clone(),
        }
    }
}

impl FromIterator<(String, PreferenceValue)> for Preferences {
    fn from_iter<I: IntoIterator<Item = (String, PreferenceValue)>>(iter: I) -> Self {
        Self {
            values: Arc::new(iter.into_iter().collect()),
        }
    }
}

/// The editable copy of a snapshot handed to a transaction.
///
/// Changes become visible to other readers only when the transaction commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutablePreferences {
    values: BTreeMap<String, PreferenceValue>,
}

impl MutablePreferences {
    /// See [`Preferences::get`].
    pub fn get<T: PreferenceType>(&self, key: &Key<T>) -> Result<Option<T>, StoreError> {
        typed_lookup(&self.values, key)
    }

    /// Set a value, replacing any previous value of any kind.
    pub fn set<T: PreferenceType>(&mut self, key: &Key<T>, value: T) {
        self.values
            .insert(key.name().to_string(), value.into_value());
    }

    /// Set a raw value by name.
    pub fn set_raw(&mut self, name: impl Into<String>, value: PreferenceValue) {
        self.values.insert(name.into(), value);
    }

    /// Remove a key. Returns `true` if it was set.
    pub fn remove<T>(&mut self, key: &Key<T>) -> bool {
        self.values.remove(key.name()).is_some()
    }

    /// Returns `true` if the key is set.
    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.values.contains_key(key.name())
    }

    /// Returns `true` if a key with this name is set.
    pub fn contains_name(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Freeze into an immutable snapshot.
    pub fn freeze(self) -> Preferences {
        Preferences {
            values: Arc::new(self.values),
        }
    }
}

fn typed_lookup<T: PreferenceType>(
    values: &BTreeMap<String, PreferenceValue>,
    key: &Key<T>,
) -> Result<Option<T>, StoreError> {
    match values.get(key.name()) {
        None => Ok(None),
        Some(value) => T::from_value(value)
            .map(Some)
            .ok_or_else(|| StoreError::TypeMismatch {
                key: key.name().to_string(),
                expected: T::KIND,
                found: value.kind(),
            }),
    }
}
