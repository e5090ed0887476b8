use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

pub const CATEGORY_DIRECT_CHANNEL_SHOW: &str = "direct_channel_show";
pub const CATEGORY_GROUP_CHANNEL_SHOW: &str = "group_channel_show";
pub const CATEGORY_THEME: &str = "theme";
pub const CATEGORY_AUTO_RESET_MANUAL_STATUS: &str = "auto_reset_manual_status";

pub const PREFERENCE_TRUE: &str = "true";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub user_id: UserId,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl PreferenceRecord {
    #[must_use]
    pub fn new(
        user_id: UserId,
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            category: category.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Record flipping a conversation to visible.
    #[must_use]
    pub fn visible(user_id: UserId, category: &str, name: impl Into<String>) -> Self {
        Self::new(user_id, category, name, PREFERENCE_TRUE)
    }
}

/// The signed-in user's preferences keyed by `(category, name)`.
#[derive(Debug, Default)]
pub struct PreferenceStore {
    entries: RwLock<BTreeMap<(String, String), String>>,
}

impl PreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, category: &str, name: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(category.to_string(), name.to_string()))
            .cloned()
    }

    /// Stored booleans are the literal strings `"true"` / `"false"`.
    #[must_use]
    pub fn get_bool(&self, category: &str, name: &str, default: bool) -> bool {
        self.get(category, name)
            .map_or(default, |value| value == PREFERENCE_TRUE)
    }

    pub fn set(&self, category: &str, name: &str, value: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((category.to_string(), name.to_string()), value.into());
    }

    pub fn merge<'a>(&self, records: impl IntoIterator<Item = &'a PreferenceRecord>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            entries.insert(
                (record.category.clone(), record.name.clone()),
                record.value.clone(),
            );
        }
    }

    pub fn remove<'a>(&self, records: impl IntoIterator<Item = &'a PreferenceRecord>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            entries.remove(&(record.category.clone(), record.name.clone()));
        }
    }

    /// `(name, value)` pairs of one category, ordered by name.
    #[must_use]
    pub fn category(&self, category: &str) -> Vec<(String, String)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|((entry_category, _), _)| entry_category == category)
            .map(|((_, name), value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
