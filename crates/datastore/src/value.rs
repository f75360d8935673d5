//! Value kinds that can be stored in a preferences store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single stored preference value.
///
/// The set of kinds is closed: every [`Key`](crate::Key) is typed with a Rust type implementing
/// [`PreferenceType`], which maps to exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PreferenceValue {
    #[allow(missing_docs)]
    Bool(bool),
    #[allow(missing_docs)]
    Int(i32),
    #[allow(missing_docs)]
    Long(i64),
    #[allow(missing_docs)]
    Float(f32),
    #[allow(missing_docs)]
    Double(f64),
    #[allow(missing_docs)]
    String(String),
    #[allow(missing_docs)]
    StringSet(BTreeSet<String>),
}

impl PreferenceValue {
    /// Human readable name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PreferenceValue::Bool(_) => bool::KIND,
            PreferenceValue::Int(_) => i32::KIND,
            PreferenceValue::Long(_) => i64::KIND,
            PreferenceValue::Float(_) => f32::KIND,
            PreferenceValue::Double(_) => f64::KIND,
            PreferenceValue::String(_) => String::KIND,
            PreferenceValue::StringSet(_) => BTreeSet::<String>::KIND,
        }
    }
    /// Returns `false` for NaN and infinite numbers, which have no JSON representation.
    pub fn is_finite(&self) -> bool {
        match self {
            PreferenceValue::Float(f) => f.is_finite(),
            PreferenceValue::Double(d) => d.is_finite(),
            _ => true,
        }
    }
}

/// A Rust type that can be stored under a typed [`Key`](crate::Key).
///
/// This trait is sealed; the supported types are `bool`, `i32`, `i64`, `f32`, `f64`, `String`
/// and `BTreeSet<String>`.
pub trait PreferenceType: Clone + Send + Sync + 'static + sealed::Sealed {
    /// Name of the value kind.
    const KIND: &'static str;

    /// Wrap the value for storage.
    fn into_value(self) -> PreferenceValue;

    /// Extract the value, returning `None` if the stored kind does not match.
    fn from_value(value: &PreferenceValue) -> Option<Self>;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_preference_type {
    ($ty:ty, $variant:ident, $kind:literal) => {
        impl sealed::Sealed for $ty {}

        impl PreferenceType for $ty {
            const KIND: &'static str = $kind;

            fn into_value(self) -> PreferenceValue {
                PreferenceValue::$variant(self)
            }

            fn from_value(value: &PreferenceValue) -> Option<Self> {
                match value {
                    PreferenceValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_preference_type!(bool, Bool, "bool");
impl_preference_type!(i32, Int, "int");
impl_preference_type!(i64, Long, "long");
impl_preference_type!(f32, Float, "float");
impl_preference_type!(f64, Double, "double");
impl_preference_type!(String, String, "string");
impl_preference_type!(BTreeSet<String>, StringSet, "string set");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_type() {
        assert_eq!(true.into_value().kind(), bool::KIND);
        assert_eq!(7i64.into_value().kind(), "long");
        assert_eq!(
            BTreeSet::from(["a".to_string()]).into_value().kind(),
            "string set"
        );
    }

    #[test]
    fn test_from_value_rejects_other_kinds() {
        assert_eq!(i32::from_value(&PreferenceValue::Int(3)), Some(3));
        assert_eq!(i32::from_value(&PreferenceValue::Long(3)), None);
        assert_eq!(String::from_value(&PreferenceValue::Bool(true)), None);
    }

    #[test]
    fn test_serialized_form() {
        let json = serde_json::to_value(PreferenceValue::String("BY_DEADLINE".to_string()))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "string", "value": "BY_DEADLINE" })
        );
    }
}
