//! History survives restarts through the JSON settings file

use std::sync::Arc;
use std::time::Duration;

use app_lib::clipboard::{lock_pasteboard, shared, MemoryPasteboard, POLL_INTERVAL};
use app_lib::history::ClipboardEntry;
use app_lib::hotkey::InertKeySource;
use app_lib::settings::{
    load_history, save_history, Config, JsonFileStore, SettingsStore, KEY_MAX_ITEMS,
};
use app_lib::{App, Services};

fn open(dir: &tempfile::TempDir) -> Arc<JsonFileStore> {
    Arc::new(JsonFileStore::open(dir.path().join("settings.json")))
}

#[tokio::test(start_paused = true)]
async fn history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let pasteboard = shared(MemoryPasteboard::new());
    let app = App::start(Services::new(
        open(&dir),
        pasteboard.clone(),
        Box::new(InertKeySource),
    ));
    tokio::time::sleep(Duration::from_millis(10)).await;

    for text in ["alpha", "beta"] {
        lock_pasteboard(&pasteboard).write_text(text).unwrap();
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    let before = app.handle().snapshot().entries;
    app.shutdown().await;

    // Fresh process: reopen the file from disk
    let app = App::start(Services::new(
        open(&dir),
        shared(MemoryPasteboard::new()),
        Box::new(InertKeySource),
    ));
    let after = app.handle().snapshot().entries;
    assert_eq!(after, before);
    assert_eq!(after[0].content, "beta");

    app.shutdown().await;
}

#[test]
fn lowered_max_items_trims_oldest_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    let entries: Vec<ClipboardEntry> = (0..10)
        .map(|i| ClipboardEntry::new(format!("entry {}", i)))
        .collect();
    save_history(store.as_ref(), &entries);
    store.set(KEY_MAX_ITEMS, serde_json::Value::from(3)).unwrap();

    let store = open(&dir);
    let config = Config::load(store.as_ref());
    let history = load_history(store.as_ref(), config.max_items);

    assert_eq!(history.len(), 3);
    assert_eq!(history.entries(), &entries[..3]);

    // The trimmed list was written back
    let reopened = open(&dir);
    assert_eq!(load_history(reopened.as_ref(), 100).len(), 3);
}

#[test]
fn settings_file_uses_stable_slot_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    Config::default().save_max_items(store.as_ref()).unwrap();
    Config::default().save_hotkey(store.as_ref()).unwrap();
    save_history(store.as_ref(), &[ClipboardEntry::new("x")]);

    let raw = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["maxItems"], 100);
    assert_eq!(json["shortcutKeyCode"], 3);
    assert_eq!(json["shortcutModifiers"], 1_179_648);
    assert_eq!(json["clipboardHistory"][0]["content"], "x");
    assert!(json["clipboardHistory"][0]["id"].is_string());
}
