use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::PreferencesError;

/// How tasks are sorted.
///
/// Encodes two independent toggles, sorting by deadline and sorting by priority, as one value.
/// [`SortOrder::from_flags`] and [`SortOrder::flags`] convert between the two representations
/// and are exact inverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    /// Not sorted.
    #[default]
    None,
    #[allow(missing_docs)]
    ByDeadline,
    #[allow(missing_docs)]
    ByPriority,
    #[allow(missing_docs)]
    ByDeadlineAndPriority,
}

impl SortOrder {
    /// Every sort order.
    pub const ALL: [SortOrder; 4] = [
        SortOrder::None,
        SortOrder::ByDeadline,
        SortOrder::ByPriority,
        SortOrder::ByDeadlineAndPriority,
    ];

    /// The sort order for the given toggles.
    pub const fn from_flags(by_deadline: bool, by_priority: bool) -> Self {
        match (by_deadline, by_priority) {
            (false, false) => SortOrder::None,
            (true, false) => SortOrder::ByDeadline,
            (false, true) => SortOrder::ByPriority,
            (true, true) => SortOrder::ByDeadlineAndPriority,
        }
    }

    /// The `(by_deadline, by_priority)` toggles of this sort order.
    pub const fn flags(self) -> (bool, bool) {
        match self {
            SortOrder::None => (false, false),
            SortOrder::ByDeadline => (true, false),
            SortOrder::ByPriority => (false, true),
            SortOrder::ByDeadlineAndPriority => (true, true),
        }
    }

    #[allow(missing_docs)]
    pub const fn is_by_deadline(self) -> bool {
        self.flags().0
    }

    #[allow(missing_docs)]
    pub const fn is_by_priority(self) -> bool {
        self.flags().1
    }

    /// Turn deadline sorting on or off, keeping priority sorting as is.
    pub const fn with_deadline(self, enable: bool) -> Self {
        Self::from_flags(enable, self.is_by_priority())
    }

    /// Turn priority sorting on or off, keeping deadline sorting as is.
    pub const fn with_priority(self, enable: bool) -> Self {
        Self::from_flags(self.is_by_deadline(), enable)
    }

    /// The persisted name.
    pub const fn name(self) -> &'static str {
        match self {
            SortOrder::None => "NONE",
            SortOrder::ByDeadline => "BY_DEADLINE",
            SortOrder::ByPriority => "BY_PRIORITY",
            SortOrder::ByDeadlineAndPriority => "BY_DEADLINE_AND_PRIORITY",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortOrder {
    type Err = PreferencesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.name() == s)
            .ok_or_else(|| PreferencesError::UnknownSortOrder(s.to_string()))
    }
}
