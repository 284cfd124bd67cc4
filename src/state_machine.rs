//! State machine for the clipboard history
//!
//! This module implements the core state machine using a single-writer pattern.
//! All mutations go through the `reduce()` function, which updates the state
//! in place and returns a list of effects to execute. Only the state loop
//! calls it, so the history is never touched by two activities at once.

use crate::history::{ClipboardEntry, HistoryStore};
use crate::hotkey::{Hotkey, HotkeyRecorder, KeyEvent, RecordOutcome};
use crate::settings::{clamp_max_items, Config};

/// Authoritative application state, owned by the state loop
#[derive(Debug, Default)]
pub struct State {
    pub history: HistoryStore,
    pub config: Config,
    pub recorder: HotkeyRecorder,
    /// The history changed since the last persisted snapshot
    pub dirty: bool,
}

impl State {
    pub fn new(history: HistoryStore, config: Config) -> Self {
        Self {
            history,
            config,
            recorder: HotkeyRecorder::new(),
            dirty: false,
        }
    }
}

/// Events that can trigger state transitions.
/// These are sent from the poller, the key source, the persistence debouncer
/// and the presentation layer.
#[derive(Debug, Clone)]
pub enum Event {
    /// The poller saw new text on the clipboard
    ClipboardChanged { text: String },
    /// User deleted an entry
    Delete { id: String },
    /// User picked an entry: put it back on the clipboard and drop it from history
    CopyAndConsume { id: String },
    /// User cleared the whole history
    Clear,
    /// User changed the history capacity
    SetMaxItems(usize),
    /// A system-wide key-down
    KeyDown(KeyEvent),
    /// Presentation asked to show/hide the list (menu click)
    TogglePresentation,
    StartHotkeyRecording,
    CancelHotkeyRecording,
    /// The persistence debounce timer elapsed
    PersistDue,
    /// Application exit requested
    Exit,
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    HistoryChanged(Vec<ClipboardEntry>),
    TogglePresentation,
    RecordingStarted,
    HotkeyRecorded(Hotkey),
    RecordingCancelled,
    ConfigChanged(Config),
}

/// Effects to be executed after a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Install text as the live clipboard content
    WriteClipboard { text: String },
    /// (Re)start the persistence debounce timer
    SchedulePersist,
    /// Write this snapshot of the history now
    Persist { entries: Vec<ClipboardEntry> },
    SaveMaxItems { max_items: usize },
    SaveHotkey { hotkey: Hotkey },
    Emit(UiEvent),
}

/// Effects shared by every history mutation
fn history_changed(state: &mut State) -> Vec<Effect> {
    state.dirty = true;
    vec![
        Effect::SchedulePersist,
        Effect::Emit(UiEvent::HistoryChanged(state.history.entries().to_vec())),
    ]
}

/// Reducer: apply `event` to `state`, returning the effects to run.
///
/// Key rules:
/// - Unknown ids are no-ops, not errors
/// - Every history mutation schedules persistence and notifies the UI
/// - `max_items` changes apply on the next insert or load, not retroactively
pub fn reduce(state: &mut State, event: Event) -> Vec<Effect> {
    use Effect::*;

    match event {
        Event::ClipboardChanged { text } => {
            let max_items = state.config.max_items;
            match state.history.insert(text, max_items) {
                Some(entry) => {
                    log::debug!("History: recorded entry {}", entry.id);
                    history_changed(state)
                }
                None => {
                    log::trace!("History: same as most recent entry, skipped");
                    vec![]
                }
            }
        }

        Event::Delete { id } => match state.history.delete(&id) {
            Some(_) => history_changed(state),
            None => vec![],
        },

        Event::CopyAndConsume { id } => match state.history.delete(&id) {
            Some(entry) => {
                let mut effects = vec![WriteClipboard {
                    text: entry.content,
                }];
                effects.extend(history_changed(state));
                effects
            }
            None => vec![],
        },

        Event::Clear => {
            if state.history.is_empty() {
                return vec![];
            }
            state.history.clear();
            history_changed(state)
        }

        Event::SetMaxItems(n) => {
            let max_items = clamp_max_items(n);
            if max_items == state.config.max_items {
                return vec![];
            }
            state.config.max_items = max_items;
            vec![
                SaveMaxItems { max_items },
                Emit(UiEvent::ConfigChanged(state.config)),
            ]
        }

        Event::KeyDown(key) => match state.recorder.feed(&key) {
            RecordOutcome::Recorded(hotkey) => {
                log::info!("Hotkey recorded: {}", hotkey);
                state.config.hotkey = hotkey;
                vec![
                    SaveHotkey { hotkey },
                    Emit(UiEvent::HotkeyRecorded(hotkey)),
                    Emit(UiEvent::ConfigChanged(state.config)),
                ]
            }
            RecordOutcome::Waiting => vec![],
            RecordOutcome::Idle => {
                if state.config.hotkey.matches(&key) {
                    log::info!("Hotkey triggered: {}", state.config.hotkey);
                    vec![Emit(UiEvent::TogglePresentation)]
                } else {
                    vec![]
                }
            }
        },

        Event::TogglePresentation => vec![Emit(UiEvent::TogglePresentation)],

        Event::StartHotkeyRecording => {
            state.recorder.start();
            vec![Emit(UiEvent::RecordingStarted)]
        }

        Event::CancelHotkeyRecording => {
            if state.recorder.cancel() {
                vec![Emit(UiEvent::RecordingCancelled)]
            } else {
                vec![]
            }
        }

        // Flush on both: a due timer, and a final write before exit
        Event::PersistDue | Event::Exit => {
            if !state.dirty {
                return vec![];
            }
            state.dirty = false;
            vec![Persist {
                entries: state.history.entries().to_vec(),
            }]
        }
    }
}
