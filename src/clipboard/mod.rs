//! System clipboard access and change polling

pub mod poller;
mod system;

pub use poller::{PasteboardPoller, PollerHandle, POLL_INTERVAL};
pub use system::SystemPasteboard;

use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PasteboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard read failed: {0}")]
    Read(String),
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// The platform pasteboard as seen by the poller
pub trait Pasteboard: Send {
    /// Value that changes whenever the clipboard content changes
    fn change_count(&mut self) -> Result<u64, PasteboardError>;

    /// Current text content. `None` when the clipboard holds no text.
    fn read_text(&mut self) -> Result<Option<String>, PasteboardError>;

    /// Install `text` as the live clipboard content
    fn write_text(&mut self, text: &str) -> Result<(), PasteboardError>;
}

/// Pasteboard shared between the poller and the effect runner
pub type SharedPasteboard = Arc<Mutex<dyn Pasteboard>>;

pub fn shared<P: Pasteboard + 'static>(pasteboard: P) -> SharedPasteboard {
    Arc::new(Mutex::new(pasteboard))
}

/// In-process pasteboard with a real change counter
#[derive(Debug, Default, Clone)]
pub struct MemoryPasteboard {
    change_count: u64,
    text: Option<String>,
}

impl MemoryPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another application copying `text`
    pub fn copy(&mut self, text: &str) {
        self.text = Some(text.to_string());
        self.change_count += 1;
    }

    /// Simulate another application copying non-text data (an image, files)
    pub fn copy_non_text(&mut self) {
        self.text = None;
        self.change_count += 1;
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl Pasteboard for MemoryPasteboard {
    fn change_count(&mut self) -> Result<u64, PasteboardError> {
        Ok(self.change_count)
    }

    fn read_text(&mut self) -> Result<Option<String>, PasteboardError> {
        Ok(self.text.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<(), PasteboardError> {
        self.copy(text);
        Ok(())
    }
}

/// Lock a shared pasteboard, recovering from a poisoned mutex
pub fn lock_pasteboard(
    pasteboard: &SharedPasteboard,
) -> std::sync::MutexGuard<'_, dyn Pasteboard + 'static> {
    pasteboard.lock().unwrap_or_else(|p| p.into_inner())
}
