use std::collections::HashSet;

use tracing::{debug, warn};

use crate::core::storage::KeyValueStore;
use crate::shared::error::AppResult;
use crate::shared::types::TranslationRecord;

/// Default number of translations kept
pub const MAX_HISTORY_SIZE: usize = 8;

/// Capped, newest-first list of past translations
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    items: Vec<TranslationRecord>,
    max_items: usize,
}

impl History {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            max_items,
        }
    }

    /// Build from an already newest-first list, enforcing the cap and id
    /// uniqueness (the first occurrence of an id wins).
    pub fn from_items(items: Vec<TranslationRecord>, max_items: usize) -> Self {
        let mut seen = HashSet::new();
        let mut items: Vec<_> = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        items.truncate(max_items);
        Self { items, max_items }
    }

    /// Prepend a record, evicting the oldest ones past the cap.
    /// Returns the evicted records, oldest last.
    pub fn push(&mut self, record: TranslationRecord) -> Vec<TranslationRecord> {
        // A duplicate id would break lookups by id; replace the older entry.
        self.items.retain(|item| item.id != record.id);
        self.items.insert(0, record);
        if self.items.len() > self.max_items {
            self.items.split_off(self.max_items)
        } else {
            Vec::new()
        }
    }

    /// Remove the record with `id`, keeping the order of the rest
    pub fn remove(&mut self, id: &str) -> Option<TranslationRecord> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&TranslationRecord> {
        self.items.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&TranslationRecord> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn items(&self) -> &[TranslationRecord] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Restore history from `store`.
    ///
    /// Never fails: an absent key, a storage error or unparsable contents all
    /// yield an empty history.
    pub fn load(store: &dyn KeyValueStore, key: &str, max_items: usize) -> Self {
        let raw = match store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No stored history");
                return Self::new(max_items);
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read history, starting empty");
                return Self::new(max_items);
            }
        };

        match serde_json::from_str::<Vec<TranslationRecord>>(&raw) {
            Ok(items) => {
                let history = Self::from_items(items, max_items);
                debug!(key, count = history.len(), "Restored history");
                history
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to parse history, discarding it");
                Self::new(max_items)
            }
        }
    }

    /// Overwrite the stored history with the full current list
    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> AppResult<()> {
        let serialized = serde_json::to_string(&self.items)?;
        store.set(key, &serialized)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}
