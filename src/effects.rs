//! Effect runner for the clipboard history
//!
//! This module executes the effects produced by the state machine.
//! UI notifications are handled directly in the state loop.

use std::sync::{Arc, Mutex};

use crate::clipboard::{lock_pasteboard, SharedPasteboard};
use crate::debounce::Debouncer;
use crate::settings::{self, Config, SettingsStore};
use crate::state_machine::Effect;

/// Trait for running effects.
/// Implementations must not block the state loop for long.
pub trait EffectRunner: Send + Sync + 'static {
    fn run(&self, effect: Effect);
}

/// Effect runner backed by the real pasteboard and settings store
pub struct SystemEffectRunner {
    pasteboard: SharedPasteboard,
    store: Arc<dyn SettingsStore>,
    debouncer: Debouncer,
}

impl SystemEffectRunner {
    pub fn new(
        pasteboard: SharedPasteboard,
        store: Arc<dyn SettingsStore>,
        debouncer: Debouncer,
    ) -> Self {
        Self {
            pasteboard,
            store,
            debouncer,
        }
    }
}

impl EffectRunner for SystemEffectRunner {
    fn run(&self, effect: Effect) {
        match effect {
            Effect::WriteClipboard { text } => {
                let pasteboard = self.pasteboard.clone();
                // System clipboard writes can block; keep them off the loop
                tokio::task::spawn_blocking(move || {
                    if let Err(e) = lock_pasteboard(&pasteboard).write_text(&text) {
                        log::warn!("Failed to restore entry to clipboard: {}", e);
                    }
                });
            }

            Effect::SchedulePersist => self.debouncer.poke(),

            // Synchronous so the exit flush lands before shutdown
            Effect::Persist { entries } => settings::save_history(self.store.as_ref(), &entries),

            Effect::SaveMaxItems { max_items } => {
                let config = Config {
                    max_items,
                    ..Config::default()
                };
                if let Err(e) = config.save_max_items(self.store.as_ref()) {
                    log::warn!("Settings: failed to save max items: {}", e);
                }
            }

            Effect::SaveHotkey { hotkey } => {
                let config = Config {
                    hotkey,
                    ..Config::default()
                };
                if let Err(e) = config.save_hotkey(self.store.as_ref()) {
                    log::warn!("Settings: failed to save hotkey: {}", e);
                }
            }

            Effect::Emit(event) => {
                log::warn!("Emit effect reached the runner, dropping {:?}", event);
            }
        }
    }
}

/// Records effects instead of running them (tests)
#[derive(Debug, Default)]
pub struct RecordingEffectRunner {
    effects: Mutex<Vec<Effect>>,
}

impl RecordingEffectRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<Effect> {
        let mut effects = self.effects.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *effects)
    }
}

impl EffectRunner for RecordingEffectRunner {
    fn run(&self, effect: Effect) {
        log::debug!("Recorded effect: {:?}", effect);
        self.effects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{shared, MemoryPasteboard};
    use crate::debounce::{PERSIST_DEBOUNCE, PERSIST_MAX_DELAY};
    use crate::history::ClipboardEntry;
    use crate::hotkey::{Hotkey, Modifiers};
    use crate::settings::{MemoryStore, KEY_HISTORY, KEY_MAX_ITEMS, KEY_SHORTCUT_MODIFIERS};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn runner() -> (SystemEffectRunner, SharedPasteboard, Arc<MemoryStore>) {
        let pasteboard = shared(MemoryPasteboard::new());
        let store = Arc::new(MemoryStore::new());
        let (tx, _rx) = mpsc::channel(1);
        let debouncer = Debouncer::spawn(tx, PERSIST_DEBOUNCE, PERSIST_MAX_DELAY);
        let runner = SystemEffectRunner::new(pasteboard.clone(), store.clone(), debouncer);
        (runner, pasteboard, store)
    }

    #[tokio::test]
    async fn persist_writes_history_slot() {
        let (runner, _, store) = runner();
        runner.run(Effect::Persist {
            entries: vec![ClipboardEntry::new("a"), ClipboardEntry::new("b")],
        });

        let saved: Vec<ClipboardEntry> =
            serde_json::from_value(store.get(KEY_HISTORY).unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].content, "a");
    }

    #[tokio::test]
    async fn config_effects_write_only_their_slots() {
        let (runner, _, store) = runner();
        runner.run(Effect::SaveMaxItems { max_items: 12 });
        assert_eq!(store.get(KEY_MAX_ITEMS), Some(serde_json::Value::from(12)));
        assert!(store.get(KEY_SHORTCUT_MODIFIERS).is_none());

        let hotkey = Hotkey::new(9, Modifiers::CONTROL).unwrap();
        runner.run(Effect::SaveHotkey { hotkey });
        assert_eq!(Config::load(store.as_ref()).hotkey, hotkey);
        assert_eq!(Config::load(store.as_ref()).max_items, 12);
    }

    #[tokio::test]
    async fn write_clipboard_reaches_pasteboard() {
        let (runner, pasteboard, _) = runner();
        runner.run(Effect::WriteClipboard {
            text: "restored".to_string(),
        });

        let mut text = None;
        for _ in 0..50 {
            text = lock_pasteboard(&pasteboard).read_text().unwrap();
            if text.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(text.as_deref(), Some("restored"));
    }

    #[test]
    fn recording_runner_collects_effects() {
        let runner = RecordingEffectRunner::new();
        runner.run(Effect::SchedulePersist);
        runner.run(Effect::SaveMaxItems { max_items: 3 });

        assert_eq!(
            runner.take(),
            vec![Effect::SchedulePersist, Effect::SaveMaxItems { max_items: 3 }]
        );
        assert!(runner.take().is_empty());
    }
}
