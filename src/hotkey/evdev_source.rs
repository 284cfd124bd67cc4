//! Global key events via evdev
//!
//! Reads keyboard events directly from /dev/input/event* devices, bypassing
//! Wayland's compositor-level input isolation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use evdev::{Device, InputEventKind, Key};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::manager::{HotkeyStatus, KeyEventSource, KeySourceError};
use super::{keymap, KeyEvent, Modifiers, CAPS_LOCK_FLAG};
use crate::state_machine::Event;

/// Keyboards that expose several device nodes report the same press on each
const DUPLICATE_WINDOW: Duration = Duration::from_millis(30);

/// Tracks the current state of modifier keys
#[derive(Debug, Default)]
pub struct ModifierState {
    left_ctrl: bool,
    right_ctrl: bool,
    left_alt: bool,
    right_alt: bool,
    left_shift: bool,
    right_shift: bool,
    left_meta: bool,
    right_meta: bool,
    caps_lock: bool,
}

impl ModifierState {
    /// Update modifier state based on key event
    pub fn update(&mut self, key: Key, pressed: bool) {
        match key {
            Key::KEY_LEFTCTRL => self.left_ctrl = pressed,
            Key::KEY_RIGHTCTRL => self.right_ctrl = pressed,
            Key::KEY_LEFTALT => self.left_alt = pressed,
            Key::KEY_RIGHTALT => self.right_alt = pressed,
            Key::KEY_LEFTSHIFT => self.left_shift = pressed,
            Key::KEY_RIGHTSHIFT => self.right_shift = pressed,
            Key::KEY_LEFTMETA => self.left_meta = pressed,
            Key::KEY_RIGHTMETA => self.right_meta = pressed,
            Key::KEY_CAPSLOCK if pressed => self.caps_lock = !self.caps_lock,
            _ => {}
        }
    }

    /// Check if key is a modifier
    pub fn is_modifier(key: Key) -> bool {
        matches!(
            key,
            Key::KEY_LEFTCTRL
                | Key::KEY_RIGHTCTRL
                | Key::KEY_LEFTALT
                | Key::KEY_RIGHTALT
                | Key::KEY_LEFTSHIFT
                | Key::KEY_RIGHTSHIFT
                | Key::KEY_LEFTMETA
                | Key::KEY_RIGHTMETA
                | Key::KEY_CAPSLOCK
        )
    }

    /// Raw flags in the AppKit layout. Super maps to the primary modifier.
    pub fn flags(&self) -> u64 {
        let mut modifiers = Modifiers::empty();
        if self.left_ctrl || self.right_ctrl {
            modifiers |= Modifiers::CONTROL;
        }
        if self.left_alt || self.right_alt {
            modifiers |= Modifiers::OPTION;
        }
        if self.left_shift || self.right_shift {
            modifiers |= Modifiers::SHIFT;
        }
        if self.left_meta || self.right_meta {
            modifiers |= Modifiers::COMMAND;
        }
        let mut flags = modifiers.bits();
        if self.caps_lock {
            flags |= CAPS_LOCK_FLAG;
        }
        flags
    }
}

/// Turns raw evdev key events into key-downs
#[derive(Debug, Default)]
pub struct KeyDownDetector {
    modifiers: ModifierState,
}

impl KeyDownDetector {
    /// Process a key event, returning a key-down for non-modifier presses
    ///
    /// # Arguments
    /// * `key` - The key code
    /// * `value` - 0 = released, 1 = pressed, 2 = repeat
    pub fn process_key(&mut self, key: Key, value: i32) -> Option<KeyEvent> {
        let pressed = value == 1;

        // Update modifier state for all events (press/release)
        self.modifiers.update(key, pressed);

        // Only report presses (not release, not repeat) of non-modifier keys
        if value != 1 || ModifierState::is_modifier(key) {
            return None;
        }

        let key_code = keymap::from_evdev(key)?;
        Some(KeyEvent::new(key_code, self.modifiers.flags()))
    }
}

/// Drops the same key-down seen on a second device node
struct DuplicateFilter {
    last: Mutex<Option<(KeyEvent, Instant)>>,
}

impl DuplicateFilter {
    fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    fn should_forward(&self, event: KeyEvent) -> bool {
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        let now = Instant::now();
        if let Some((prev, at)) = *last {
            if prev == event && now.duration_since(at) < DUPLICATE_WINDOW {
                log::trace!("Dropping duplicate key-down from another device");
                return false;
            }
        }
        *last = Some((event, now));
        true
    }
}

/// Find all keyboard devices on the system
pub fn find_keyboards() -> Vec<(PathBuf, Device)> {
    evdev::enumerate()
        .filter_map(|(path, device)| {
            // A keyboard should support common keys
            let is_keyboard = device.supported_keys().map_or(false, |keys| {
                keys.contains(Key::KEY_ENTER)
                    && keys.contains(Key::KEY_SPACE)
                    && keys.contains(Key::KEY_A)
                    && keys.contains(Key::KEY_Z)
            });

            if is_keyboard {
                let name = device.name().unwrap_or("Unknown");
                log::info!("Found keyboard device: {:?} ({})", path, name);
                Some((path, device))
            } else {
                None
            }
        })
        .collect()
}

/// Check if we have permission to access input devices
/// Takes pre-discovered keyboards to avoid redundant enumeration
pub fn check_permissions(keyboards: &[(PathBuf, Device)]) -> Result<(), KeySourceError> {
    if keyboards.is_empty() {
        // Try to determine why
        let all_devices: Vec<_> = evdev::enumerate().collect();

        if all_devices.is_empty() {
            return Err(KeySourceError::Permission(
                "No input devices found. Ensure you are in the 'input' group:\n\
                 sudo usermod -aG input $USER\n\
                 Then log out and back in."
                    .to_string(),
            ));
        } else {
            return Err(KeySourceError::Permission(format!(
                "Found {} input devices but none appear to be keyboards. \
                 This might be a permissions issue or no keyboard is connected.",
                all_devices.len()
            )));
        }
    }

    Ok(())
}

/// Reads key-downs from every keyboard device
pub struct EvdevKeySource {
    cancel_token: Option<CancellationToken>,
}

impl EvdevKeySource {
    pub fn new() -> Self {
        Self { cancel_token: None }
    }

    /// Monitor a single keyboard device
    async fn monitor_device(
        path: String,
        device: Device,
        tx: mpsc::Sender<Event>,
        cancel: CancellationToken,
        duplicates: Arc<DuplicateFilter>,
    ) {
        let name = device.name().unwrap_or("Unknown").to_string();
        log::info!("Monitoring keyboard device: {} ({})", path, name);

        let mut detector = KeyDownDetector::default();

        let mut stream = match device.into_event_stream() {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to create event stream for {}: {}", path, e);
                return;
            }
        };

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    log::info!("Key monitoring cancelled for {}", path);
                    break;
                }

                result = stream.next_event() => {
                    match result {
                        Ok(ev) => {
                            let InputEventKind::Key(key) = ev.kind() else {
                                continue;
                            };
                            let Some(event) = detector.process_key(key, ev.value()) else {
                                continue;
                            };
                            if !duplicates.should_forward(event) {
                                continue;
                            }
                            if tx.send(Event::KeyDown(event)).await.is_err() {
                                log::debug!("State loop gone, stopping {}", path);
                                break;
                            }
                        }
                        Err(e) => {
                            log::warn!("Device read error for {} (disconnected?): {}", path, e);
                            break;
                        }
                    }
                }
            }
        }

        log::info!("Stopped monitoring device: {}", path);
    }
}

impl Default for EvdevKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEventSource for EvdevKeySource {
    /// Spawns one task per keyboard device.
    fn start(&mut self, tx: mpsc::Sender<Event>) -> Result<HotkeyStatus, KeySourceError> {
        self.stop();

        // Find keyboards once and check permissions
        let keyboards = find_keyboards();
        check_permissions(&keyboards)?;

        let cancel_token = CancellationToken::new();
        let duplicates = Arc::new(DuplicateFilter::new());
        let device_count = keyboards.len();

        log::info!("Starting key monitoring on {} device(s)", device_count);

        for (path, device) in keyboards {
            let tx = tx.clone();
            let cancel = cancel_token.clone();
            let duplicates = duplicates.clone();
            let path_str = path.to_string_lossy().to_string();

            tokio::spawn(async move {
                Self::monitor_device(path_str, device, tx, cancel, duplicates).await;
            });
        }

        self.cancel_token = Some(cancel_token);
        Ok(HotkeyStatus {
            active: true,
            device_count,
            error: None,
        })
    }

    fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            log::info!("Stopping key monitoring");
            token.cancel();
        }
    }
}

impl Drop for EvdevKeySource {
    fn drop(&mut self) {
        self.stop();
    }
}
