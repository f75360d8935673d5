//! Type-safe keys for preferences storage.

use std::{borrow::Cow, marker::PhantomData};

/// Declare a type-safe preference key constant.
///
/// This associates a string key name with a value type at compile time.
///
/// # Example
/// ```rust
/// use datastore::preference_key;
///
/// preference_key!(pub const SHOW_COMPLETED: bool = "show_completed");
///
/// assert_eq!(SHOW_COMPLETED.name(), "show_completed");
/// ```
#[macro_export]
macro_rules! preference_key {
    ($vis:vis const $name:ident: $ty:ty = $key:literal) => {
        $vis const $name: $crate::Key<$ty> = $crate::Key::new($key);
    };
}

/// Type-safe key for preferences storage.
///
/// Associates a string key name with a value type, preventing type mismatches while keeping
/// lookups ergonomic. Key names must be unique within a store.
///
/// # Example
/// ```rust
/// use datastore::Key;
///
/// const SORT_ORDER: Key<String> = Key::new("sort_order");
/// let counter: Key<i32> = Key::owned(format!("counter_{}", 1));
///
/// assert_eq!(SORT_ORDER.name(), "sort_order");
/// assert_eq!(counter.name(), "counter_1");
/// ```
#[derive(Debug)]
pub struct Key<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Create a new type-safe key with the given storage name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// Create a key from a name only known at runtime.
    pub fn owned(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    /// Get the string key name used for storage.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// Implemented by hand so `T` is not required to be `Clone`.
impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Key<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    preference_key!(const FLAG: bool = "flag");

    #[test]
    fn test_static_and_owned_keys_compare_by_name() {
        let owned: Key<bool> = Key::owned("flag".to_string());
        assert_eq!(FLAG, owned);
        assert_ne!(FLAG, Key::<bool>::new("other"));
    }
}
