#![doc = include_str!("../README.md")]

mod error;
mod repository;
mod sort_order;
mod user_preferences;

pub use error::PreferencesError;
pub use repository::{
    UserPreferencesRepository, UserPreferencesStream, LEGACY_PREFERENCES_NAME, USER_STORE_NAME,
};
pub use sort_order::SortOrder;
pub use user_preferences::UserPreferences;
