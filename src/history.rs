//! Bounded, most-recent-first clipboard history

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default capacity when nothing is configured
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// One captured clipboard text.
/// Serialized as `{ "id": ..., "content": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub id: String,
    pub content: String,
}

impl ClipboardEntry {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
        }
    }
}

/// Ordered history; index 0 is the most recent capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStore {
    entries: Vec<ClipboardEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from loaded entries, keeping their order
    pub fn from_entries(entries: Vec<ClipboardEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn front(&self) -> Option<&ClipboardEntry> {
        self.entries.first()
    }

    pub fn get(&self, id: &str) -> Option<&ClipboardEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Prepend `content` and evict from the tail down to `max_items`.
    ///
    /// Returns `None` without changing anything when `content` equals the
    /// current front entry.
    pub fn insert(&mut self, content: String, max_items: usize) -> Option<&ClipboardEntry> {
        if self.front().is_some_and(|front| front.content == content) {
            return None;
        }

        self.entries.insert(0, ClipboardEntry::new(content));
        self.trim(max_items);
        self.entries.first()
    }

    /// Remove the entry with `id`. Absent ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<ClipboardEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Keep the `max_items` most recent entries. Returns how many were dropped.
    pub fn trim(&mut self, max_items: usize) -> usize {
        let before = self.entries.len();
        self.entries.truncate(max_items);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(store: &HistoryStore) -> Vec<&str> {
        store.entries().iter().map(|e| e.content.as_str()).collect()
    }

    #[test]
    fn test_add_and_get_items() {
        let mut store = HistoryStore::new();
        store.insert("First item".to_string(), 10);
        store.insert("Second item".to_string(), 10);

        assert_eq!(contents(&store), vec!["Second item", "First item"]);
    }

    #[test]
    fn test_max_history_size() {
        let mut store = HistoryStore::new();
        for i in 0..10 {
            store.insert(format!("Item {}", i), 5);
            assert!(store.len() <= 5);
        }

        assert_eq!(store.len(), 5);
        assert_eq!(store.front().unwrap().content, "Item 9");
        assert_eq!(store.entries()[4].content, "Item 5");
    }

    #[test]
    fn test_skip_duplicate() {
        let mut store = HistoryStore::new();
        store.insert("Same content".to_string(), 10);
        let first_id = store.front().unwrap().id.clone();

        assert!(store.insert("Same content".to_string(), 10).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.front().unwrap().id, first_id);
    }

    #[test]
    fn non_adjacent_duplicate_is_recorded() {
        let mut store = HistoryStore::new();
        store.insert("a".to_string(), 10);
        store.insert("b".to_string(), 10);
        store.insert("a".to_string(), 10);

        assert_eq!(contents(&store), vec!["a", "b", "a"]);
    }

    #[test]
    fn ids_are_unique() {
        let mut store = HistoryStore::new();
        store.insert("x".to_string(), 10);
        store.insert("y".to_string(), 10);
        assert_ne!(store.entries()[0].id, store.entries()[1].id);
    }

    #[test]
    fn delete_keeps_relative_order() {
        let mut store = HistoryStore::new();
        for s in ["a", "b", "c", "d"] {
            store.insert(s.to_string(), 10);
        }
        let id = store.entries()[1].id.clone(); // "c"

        let removed = store.delete(&id).unwrap();
        assert_eq!(removed.content, "c");
        assert_eq!(contents(&store), vec!["d", "b", "a"]);
    }

    #[test]
    fn delete_unknown_id_is_noop() {
        let mut store = HistoryStore::new();
        store.insert("a".to_string(), 10);
        assert!(store.delete("missing").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn trim_keeps_most_recent() {
        let mut store = HistoryStore::new();
        for s in ["a", "b", "c", "d"] {
            store.insert(s.to_string(), 10);
        }

        assert_eq!(store.trim(2), 2);
        assert_eq!(contents(&store), vec!["d", "c"]);
        assert_eq!(store.trim(5), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = HistoryStore::new();
        store.insert("Item 1".to_string(), 10);
        store.insert("Item 2".to_string(), 10);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn entry_serializes_as_id_and_content() {
        let entry = ClipboardEntry {
            id: "abc".to_string(),
            content: "hello".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "abc", "content": "hello" }));
    }
}
