//! Settings store and the persisted clipboard history
//!
//! Everything lives in one JSON object keyed by stable slot names:
//! `clipboardHistory`, `maxItems`, `shortcutKeyCode`, `shortcutModifiers`.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::history::{ClipboardEntry, HistoryStore, DEFAULT_MAX_ITEMS};
use crate::hotkey::Hotkey;

const SETTINGS_FILE_NAME: &str = "settings.json";
const APP_DIR_NAME: &str = "clip-history";
/// Overrides the directory holding `settings.json`
pub const CONFIG_DIR_ENV: &str = "CLIP_HISTORY_CONFIG_DIR";

pub const KEY_HISTORY: &str = "clipboardHistory";
pub const KEY_MAX_ITEMS: &str = "maxItems";
pub const KEY_SHORTCUT_KEY_CODE: &str = "shortcutKeyCode";
pub const KEY_SHORTCUT_MODIFIERS: &str = "shortcutModifiers";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// A small durable key-value store
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-memory store (tests, and fallback when the config dir is unusable)
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object file, rewritten atomically on every `set`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    /// A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_object(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let path = &self.path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(values)?;

        // Write atomically: write to a temp file in the same directory, then rename.
        // This prevents a partial/corrupt settings.json if the app crashes mid-write.
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &contents).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        // On Unix, rename will atomically replace the destination. On Windows, rename
        // fails if the destination exists, so we remove it first (ignoring NotFound).
        if cfg!(windows) && path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(StoreError::Io {
                        path: path.clone(),
                        source: e,
                    });
                }
            }
        }

        std::fs::rename(&tmp_path, path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value);
        self.write(&values)
    }
}

fn read_object(path: &Path) -> Map<String, Value> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}: {}", path, e);
                Map::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
        Err(e) => {
            log::warn!("Settings: failed to read {:?}: {}", path, e);
            Map::new()
        }
    }
}

/// Location of `settings.json`: `$CLIP_HISTORY_CONFIG_DIR` or the platform config dir
pub fn settings_path() -> Result<PathBuf, StoreError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join(SETTINGS_FILE_NAME));
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
        .ok_or(StoreError::NoConfigDir)
}

/// User-adjustable configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// History capacity, always at least 1
    pub max_items: usize,
    pub hotkey: Hotkey,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            hotkey: Hotkey::default_toggle(),
        }
    }
}

impl Config {
    /// Read the configuration, falling back to defaults slot by slot
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();

        let max_items = store
            .get(KEY_MAX_ITEMS)
            .and_then(|v| v.as_u64())
            .map(|n| clamp_max_items(n as usize))
            .unwrap_or(defaults.max_items);

        let key_code = store
            .get(KEY_SHORTCUT_KEY_CODE)
            .and_then(|v| v.as_u64())
            .and_then(|n| u16::try_from(n).ok());
        let modifiers = store
            .get(KEY_SHORTCUT_MODIFIERS)
            .and_then(|v| v.as_u64());

        let hotkey = match (key_code, modifiers) {
            (Some(code), Some(mask)) => {
                let hotkey = Hotkey::from_raw(code, mask);
                if !hotkey.is_valid() {
                    log::warn!("Settings: stored hotkey has no modifiers; it will never trigger");
                }
                hotkey
            }
            _ => defaults.hotkey,
        };

        Self { max_items, hotkey }
    }

    pub fn save_max_items(&self, store: &dyn SettingsStore) -> Result<(), StoreError> {
        store.set(KEY_MAX_ITEMS, Value::from(self.max_items as u64))
    }

    pub fn save_hotkey(&self, store: &dyn SettingsStore) -> Result<(), StoreError> {
        store.set(KEY_SHORTCUT_KEY_CODE, Value::from(self.hotkey.key_code()))?;
        store.set(
            KEY_SHORTCUT_MODIFIERS,
            Value::from(self.hotkey.modifiers().bits()),
        )
    }
}

/// Capacity below 1 would make the history useless
pub fn clamp_max_items(n: usize) -> usize {
    n.max(1)
}

/// Load the persisted history, trimmed to `max_items`.
///
/// Missing or unparsable data is the cold-start state, not an error. The
/// trimmed result is always written back immediately.
pub fn load_history(store: &dyn SettingsStore, max_items: usize) -> HistoryStore {
    let entries = match store.get(KEY_HISTORY) {
        Some(value) => match serde_json::from_value::<Vec<ClipboardEntry>>(value) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("History: stored list is unreadable, starting empty: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let mut history = HistoryStore::from_entries(entries);
    let dropped = history.trim(max_items);
    if dropped > 0 {
        log::info!(
            "History: trimmed {} entries to fit max_items={}",
            dropped,
            max_items
        );
    }
    save_history(store, history.entries());
    log::info!("History: loaded {} entries", history.len());
    history
}

/// Best-effort write of the entry list; failures are logged and dropped.
pub fn save_history(store: &dyn SettingsStore, entries: &[ClipboardEntry]) {
    let value = match serde_json::to_value(entries) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("History: failed to serialize: {}", e);
            return;
        }
    };
    match store.set(KEY_HISTORY, value) {
        Ok(()) => log::debug!("History: saved {} entries", entries.len()),
        Err(e) => log::warn!("History: failed to save: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Modifiers;

    /// Store whose writes always fail
    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn get(&self, _key: &str) -> Option<Value> {
            None
        }

        fn set(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
            Err(StoreError::NoConfigDir)
        }
    }

    fn store_with(entries: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        let list: Vec<ClipboardEntry> = entries.iter().map(|c| ClipboardEntry::new(*c)).collect();
        save_history(&store, &list);
        store
    }

    fn contents(history: &HistoryStore) -> Vec<String> {
        history.entries().iter().map(|e| e.content.clone()).collect()
    }

    #[test]
    fn config_defaults_when_empty() {
        let config = Config::load(&MemoryStore::new());
        assert_eq!(config, Config::default());
        assert_eq!(config.max_items, 100);
        assert_eq!(config.hotkey.key_code(), 3);
        assert_eq!(config.hotkey.modifiers(), Modifiers::COMMAND | Modifiers::SHIFT);
    }

    #[test]
    fn config_round_trips_through_store() {
        let store = MemoryStore::new();
        let config = Config {
            max_items: 25,
            hotkey: Hotkey::new(9, Modifiers::CONTROL | Modifiers::OPTION).unwrap(),
        };
        config.save_max_items(&store).unwrap();
        config.save_hotkey(&store).unwrap();

        assert_eq!(Config::load(&store), config);
    }

    #[test]
    fn config_ignores_ill_typed_slots() {
        let store = MemoryStore::new();
        store.set(KEY_MAX_ITEMS, Value::from("lots")).unwrap();
        store.set(KEY_SHORTCUT_KEY_CODE, Value::from(70_000)).unwrap();
        store.set(KEY_SHORTCUT_MODIFIERS, Value::from(0)).unwrap();

        assert_eq!(Config::load(&store), Config::default());
    }

    #[test]
    fn zero_max_items_is_clamped() {
        let store = MemoryStore::new();
        store.set(KEY_MAX_ITEMS, Value::from(0)).unwrap();
        assert_eq!(Config::load(&store).max_items, 1);
    }

    #[test]
    fn persist_then_load_preserves_order() {
        let store = store_with(&["c", "b", "a"]);
        let history = load_history(&store, 10);
        assert_eq!(contents(&history), vec!["c", "b", "a"]);
    }

    #[test]
    fn load_trims_to_lowered_max_and_repersists() {
        let store = store_with(&["newest", "middle", "oldest"]);

        let history = load_history(&store, 2);
        assert_eq!(contents(&history), vec!["newest", "middle"]);

        let persisted: Vec<ClipboardEntry> =
            serde_json::from_value(store.get(KEY_HISTORY).unwrap()).unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted[0].content, "newest");
    }

    #[test]
    fn corrupt_history_loads_empty() {
        let store = MemoryStore::new();
        store
            .set(KEY_HISTORY, serde_json::json!({ "not": "a list" }))
            .unwrap();
        assert!(load_history(&store, 10).is_empty());
    }

    #[test]
    fn load_writes_back_even_without_trimming() {
        let store = MemoryStore::new();
        store.set(KEY_HISTORY, Value::from("garbage")).unwrap();

        load_history(&store, 10);
        assert_eq!(store.get(KEY_HISTORY), Some(serde_json::json!([])));
    }

    #[test]
    fn missing_history_loads_empty() {
        assert!(load_history(&MemoryStore::new(), 10).is_empty());
    }

    #[test]
    fn save_failure_is_swallowed() {
        save_history(&BrokenStore, &[ClipboardEntry::new("x")]);
        assert!(load_history(&BrokenStore, 10).is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = JsonFileStore::open(&path);
        store.set(KEY_MAX_ITEMS, Value::from(7)).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get(KEY_MAX_ITEMS), Some(Value::from(7)));
    }

    #[test]
    fn file_store_starts_empty_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.get(KEY_HISTORY).is_none());
    }
}
