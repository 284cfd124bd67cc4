//! Key event sources - feed system-wide key-downs into the state loop

use thiserror::Error;
use tokio::sync::mpsc;

use crate::state_machine::Event;

#[derive(Debug, Clone, Error)]
pub enum KeySourceError {
    /// No usable input devices; usually a missing permission.
    #[error("{0}")]
    Permission(String),
    #[error("global key events are not supported on this platform")]
    Unsupported,
}

/// Status information about the key source
#[derive(Debug, Clone)]
pub struct HotkeyStatus {
    pub active: bool,
    pub device_count: usize,
    pub error: Option<String>,
}

/// Create a "failed" status for when the source could not start
pub fn failed_status(error: String) -> HotkeyStatus {
    HotkeyStatus {
        active: false,
        device_count: 0,
        error: Some(error),
    }
}

/// A source of global key-down events.
///
/// Implementations send `Event::KeyDown` for every non-modifier key press
/// until `stop()` is called or the source is dropped. Modifier keys on
/// their own and auto-repeat are not reported.
pub trait KeyEventSource: Send {
    fn start(&mut self, tx: mpsc::Sender<Event>) -> Result<HotkeyStatus, KeySourceError>;

    /// Release any OS-level listeners. Must be idempotent.
    fn stop(&mut self);
}

/// Source that never produces events; the hotkey stays inert.
#[derive(Debug, Default)]
pub struct InertKeySource;

impl KeyEventSource for InertKeySource {
    fn start(&mut self, _tx: mpsc::Sender<Event>) -> Result<HotkeyStatus, KeySourceError> {
        Err(KeySourceError::Unsupported)
    }

    fn stop(&mut self) {}
}

/// The key source for the current platform
pub fn default_source() -> Box<dyn KeyEventSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(super::evdev_source::EvdevKeySource::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(InertKeySource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inert_source_reports_unsupported() {
        let (tx, _rx) = mpsc::channel(1);
        let mut source = InertKeySource;
        assert!(matches!(
            source.start(tx),
            Err(KeySourceError::Unsupported)
        ));
        source.stop();
    }

    #[test]
    fn failed_status_is_inactive() {
        let status = failed_status("no devices".to_string());
        assert!(!status.active);
        assert_eq!(status.device_count, 0);
        assert_eq!(status.error.as_deref(), Some("no devices"));
    }
}
