//! arboard-backed system clipboard
//!
//! arboard has no change counter, so one is derived: every sample whose
//! text differs from the previous sample bumps the counter, and so does
//! every successful write.

use std::time::Duration;

use super::{Pasteboard, PasteboardError};

/// How long a write thread keeps X11 selection ownership alive
#[cfg(target_os = "linux")]
const SELECTION_HOLD: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
pub struct SystemPasteboard {
    change_count: u64,
    last_text: Option<String>,
    sampled: bool,
}

impl SystemPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn sample(&mut self) -> Result<(), PasteboardError> {
        // arboard::Clipboard is not Send, so open a fresh handle per sample
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| PasteboardError::Unavailable(e.to_string()))?;

        let text = match clipboard.get_text() {
            Ok(text) if text.is_empty() => None,
            Ok(text) => Some(text),
            Err(arboard::Error::ContentNotAvailable) => None,
            Err(e) => return Err(PasteboardError::Read(e.to_string())),
        };

        self.observe(text);
        Ok(())
    }

    /// Fold one sampled value into the derived counter
    fn observe(&mut self, text: Option<String>) {
        if !self.sampled || text != self.last_text {
            self.change_count += 1;
            self.last_text = text;
        }
        self.sampled = true;
    }

    /// A write is a change even when the text is what was already there
    fn record_write(&mut self, text: String) {
        self.change_count += 1;
        self.last_text = Some(text);
        self.sampled = true;
    }
}

impl Pasteboard for SystemPasteboard {
    fn change_count(&mut self) -> Result<u64, PasteboardError> {
        self.sample()?;
        Ok(self.change_count)
    }

    /// Text captured by the latest `change_count` sample
    fn read_text(&mut self) -> Result<Option<String>, PasteboardError> {
        if !self.sampled {
            self.sample()?;
        }
        Ok(self.last_text.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<(), PasteboardError> {
        let owned = text.to_string();

        // Signal the set result back; the thread may outlive this call on Linux
        let (result_tx, result_rx) = std::sync::mpsc::sync_channel::<Result<(), String>>(1);

        std::thread::spawn(move || {
            let text = owned;
            let mut clipboard = match arboard::Clipboard::new() {
                Ok(c) => c,
                Err(e) => {
                    let _ = result_tx.send(Err(format!("Clipboard access failed: {}", e)));
                    return;
                }
            };
            if let Err(e) = clipboard.set_text(&text) {
                let _ = result_tx.send(Err(format!("Clipboard set failed: {}", e)));
                return;
            }
            log::info!("Copied {} chars to clipboard", text.len());
            let _ = result_tx.send(Ok(()));

            // On Linux/X11, keep clipboard alive for other apps to read
            #[cfg(target_os = "linux")]
            {
                let start = std::time::Instant::now();
                while start.elapsed() < SELECTION_HOLD {
                    std::thread::sleep(Duration::from_millis(100));
                    match clipboard.get_text() {
                        Ok(current) if current == text => {}
                        _ => {
                            log::debug!("Clipboard ownership transferred");
                            break;
                        }
                    }
                }
                log::debug!("Clipboard thread exiting after {:?}", start.elapsed());
            }
        });

        match result_rx.recv_timeout(WRITE_TIMEOUT) {
            Ok(Ok(())) => {
                self.record_write(text.to_string());
                Ok(())
            }
            Ok(Err(e)) => Err(PasteboardError::Write(e)),
            Err(_) => Err(PasteboardError::Write(
                "clipboard write timed out".to_string(),
            )),
        }
    }
}
