//! Hotkey recording: capture a new combination from the user's next key-down

use super::{Hotkey, KeyEvent};

/// Result of feeding a key-down to the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Not in recording mode; the event should go to normal matching.
    Idle,
    /// Recording, but the event carried no modifiers. Still listening.
    Waiting,
    /// A combination was captured and recording has ended.
    Recorded(Hotkey),
}

/// Tracks whether the user is currently recording a new hotkey
#[derive(Debug, Default)]
pub struct HotkeyRecorder {
    recording: bool,
}

impl HotkeyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.recording = true;
    }

    /// Leave recording mode without touching the configuration.
    /// Returns whether recording was active.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.recording, false)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Process a key-down while (possibly) recording
    pub fn feed(&mut self, event: &KeyEvent) -> RecordOutcome {
        if !self.recording {
            return RecordOutcome::Idle;
        }

        match Hotkey::new(event.key_code, event.modifiers()) {
            Ok(hotkey) => {
                self.recording = false;
                RecordOutcome::Recorded(hotkey)
            }
            Err(_) => {
                log::trace!("Hotkey recording: ignoring bare key {}", event.key_code);
                RecordOutcome::Waiting
            }
        }
    }
}
