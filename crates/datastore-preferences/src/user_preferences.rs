use datastore::{preference_key, Preferences};
use serde::{Deserialize, Serialize};

use crate::{PreferencesError, SortOrder};

preference_key!(pub(crate) const SHOW_COMPLETED: bool = "show_completed");
preference_key!(pub(crate) const SORT_ORDER: String = "sort_order");

/// The user's task list preferences.
///
/// Not persisted as such: derived from the store on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Whether completed tasks are shown.
    pub show_completed: bool,
    #[allow(missing_docs)]
    pub sort_order: SortOrder,
}

impl UserPreferences {
    /// Decode the preferences from a snapshot. Unset keys take their defaults: completed tasks
    /// hidden and no sorting.
    pub fn from_preferences(preferences: &Preferences) -> Result<Self, PreferencesError> {
        Ok(Self {
            show_completed: preferences.get(&SHOW_COMPLETED)?.unwrap_or(false),
            sort_order: decode_sort_order(preferences.get(&SORT_ORDER)?)?,
        })
    }
}

pub(crate) fn decode_sort_order(name: Option<String>) -> Result<SortOrder, PreferencesError> {
    name.map_or(Ok(SortOrder::None), |name| name.parse())
}
