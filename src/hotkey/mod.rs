//! Global hotkey configuration and matching
//!
//! Key codes use the macOS virtual key numbering (`kVK_*`) and modifier masks
//! use the AppKit modifier-flag bit positions, so the integers stored in the
//! settings file mean the same thing on every platform. Platform key sources
//! translate their native codes into this space before events reach the
//! state loop.
//!
//! # Linux requirements
//! - User must be in the `input` group: `sudo usermod -aG input $USER`
//! - Log out and back in after adding to group

mod detector;
#[cfg(target_os = "linux")]
mod evdev_source;
pub mod keymap;
pub mod manager;

pub use detector::{HotkeyRecorder, RecordOutcome};
pub use manager::{default_source, HotkeyStatus, InertKeySource, KeyEventSource, KeySourceError};

use bitflags::bitflags;
use thiserror::Error;

/// Caps lock flag. Reported by key sources but never part of a hotkey.
pub const CAPS_LOCK_FLAG: u64 = 1 << 16;
/// Numeric keypad flag. Reported by key sources but never part of a hotkey.
pub const NUMERIC_PAD_FLAG: u64 = 1 << 21;
/// Function key flag. Reported by key sources but never part of a hotkey.
pub const FUNCTION_FLAG: u64 = 1 << 23;

bitflags! {
    /// The four modifier keys a hotkey may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u64 {
        const SHIFT = 1 << 17;
        /// Secondary modifier (Control).
        const CONTROL = 1 << 18;
        /// Alt modifier (Option).
        const OPTION = 1 << 19;
        /// Primary modifier (Command / Super).
        const COMMAND = 1 << 20;
    }
}

impl Modifiers {
    /// Reduce raw event flags to the recognized modifier keys, dropping
    /// caps lock, keypad, function and any device-specific bits.
    pub fn normalize(raw: u64) -> Self {
        Self::from_bits_truncate(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotkeyError {
    #[error("a hotkey needs at least one modifier key")]
    NoModifiers,
}

/// A hotkey combination (modifiers + key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    key_code: u16,
    modifiers: Modifiers,
}

impl Hotkey {
    /// Build a hotkey, rejecting bare keys.
    pub fn new(key_code: u16, modifiers: Modifiers) -> Result<Self, HotkeyError> {
        if modifiers.is_empty() {
            return Err(HotkeyError::NoModifiers);
        }
        Ok(Self {
            key_code,
            modifiers,
        })
    }

    /// Rebuild a hotkey from persisted integers. Unknown modifier bits are
    /// dropped; an empty set is kept as-is so a damaged settings file cannot
    /// turn every keystroke into a trigger (see [`Hotkey::matches`]).
    pub fn from_raw(key_code: u16, raw_modifiers: u64) -> Self {
        Self {
            key_code,
            modifiers: Modifiers::normalize(raw_modifiers),
        }
    }

    /// Default hotkey: Cmd+Shift+F
    pub fn default_toggle() -> Self {
        Self {
            key_code: keymap::KEY_F,
            modifiers: Modifiers::COMMAND | Modifiers::SHIFT,
        }
    }

    pub fn key_code(&self) -> u16 {
        self.key_code
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_valid(&self) -> bool {
        !self.modifiers.is_empty()
    }

    /// Exact match: same key and the same normalized modifier set.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.is_valid() && event.key_code == self.key_code && event.modifiers() == self.modifiers
    }
}

impl Default for Hotkey {
    fn default() -> Self {
        Self::default_toggle()
    }
}

impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.modifiers.contains(Modifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(Modifiers::OPTION) {
            parts.push("Opt".to_string());
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.modifiers.contains(Modifiers::COMMAND) {
            parts.push("Cmd".to_string());
        }
        parts.push(match keymap::key_name(self.key_code) {
            Some(name) => name.to_string(),
            None => format!("Key{}", self.key_code),
        });
        write!(f, "{}", parts.join("+"))
    }
}

/// A key-down observed by a key source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: u16,
    /// Raw modifier flags as reported by the source, unfiltered.
    pub flags: u64,
}

impl KeyEvent {
    pub fn new(key_code: u16, flags: u64) -> Self {
        Self { key_code, flags }
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers::normalize(self.flags)
    }
}
