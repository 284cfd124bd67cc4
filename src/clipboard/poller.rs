//! Change-counter polling of the clipboard

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{lock_pasteboard, Pasteboard, SharedPasteboard};
use crate::state_machine::Event;

/// Poll interval while the clipboard reads fine
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_CONSECUTIVE_ERRORS: u32 = 10;
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Detects clipboard changes one tick at a time
#[derive(Debug, Default)]
pub struct PasteboardPoller {
    last_change: Option<u64>,
    consecutive_errors: u32,
}

impl PasteboardPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current counter without producing a candidate
    pub fn prime(&mut self, pasteboard: &mut dyn Pasteboard) {
        match pasteboard.change_count() {
            Ok(count) => {
                self.last_change = Some(count);
                self.consecutive_errors = 0;
            }
            Err(e) => self.record_error(&e),
        }
    }

    /// Sample the clipboard once.
    ///
    /// Returns the new text when the change counter moved and the clipboard
    /// holds non-empty text. The first call only primes the counter.
    pub fn tick(&mut self, pasteboard: &mut dyn Pasteboard) -> Option<String> {
        let count = match pasteboard.change_count() {
            Ok(count) => count,
            Err(e) => {
                self.record_error(&e);
                return None;
            }
        };
        self.consecutive_errors = 0;

        let previous = self.last_change.replace(count);
        if previous.is_none() || previous == Some(count) {
            return None;
        }

        match pasteboard.read_text() {
            Ok(Some(text)) if !text.is_empty() => Some(text),
            Ok(_) => {
                log::trace!("Clipboard changed but holds no text");
                None
            }
            Err(e) => {
                // Retry this change on the next tick
                self.last_change = previous;
                self.record_error(&e);
                None
            }
        }
    }

    /// Delay before the next tick, backing off after repeated failures
    pub fn next_delay(&self, base: Duration) -> Duration {
        if self.consecutive_errors < MAX_CONSECUTIVE_ERRORS {
            return base;
        }
        let exponent = (self.consecutive_errors - MAX_CONSECUTIVE_ERRORS).min(4);
        (base * 2_u32.pow(exponent)).min(MAX_POLL_INTERVAL)
    }

    fn record_error(&mut self, err: &super::PasteboardError) {
        self.consecutive_errors += 1;
        let n = self.consecutive_errors;

        // Only log errors occasionally to avoid spam
        if n == 1 || n % 10 == 0 {
            log::warn!("Failed to read clipboard (error #{}): {}", n, err);
        }
        if n == MAX_CONSECUTIVE_ERRORS {
            log::warn!("Too many consecutive clipboard errors, reducing polling frequency");
        }
    }
}

/// Controls a running poll task
#[derive(Debug, Clone)]
pub struct PollerHandle {
    enabled: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl PollerHandle {
    /// Spawn the poll loop. New text is sent as `Event::ClipboardChanged`.
    pub fn spawn(
        pasteboard: SharedPasteboard,
        tx: mpsc::Sender<Event>,
        interval: Duration,
    ) -> Self {
        let handle = Self {
            enabled: Arc::new(AtomicBool::new(true)),
            cancel: CancellationToken::new(),
        };

        let enabled = handle.enabled.clone();
        let cancel = handle.cancel.clone();
        tokio::spawn(async move {
            run_poll_loop(pasteboard, tx, interval, enabled, cancel).await;
        });

        handle
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        log::info!(
            "Clipboard monitoring {}",
            if enabled { "enabled" } else { "paused" }
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Toggle monitoring on/off, returning the new state
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        log::info!("Clipboard monitoring toggled to {}", enabled);
        enabled
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn run_poll_loop(
    pasteboard: SharedPasteboard,
    tx: mpsc::Sender<Event>,
    interval: Duration,
    enabled: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    log::info!("Clipboard polling started (every {:?})", interval);

    let mut poller = PasteboardPoller::new();
    let mut was_enabled = false;

    loop {
        let is_enabled = enabled.load(Ordering::SeqCst);
        if is_enabled {
            // Clipboard access blocks (and may wait on a write); keep it off the runtime
            let pb = pasteboard.clone();
            let resumed = !was_enabled;
            let sampled = tokio::task::spawn_blocking(move || {
                let mut guard = lock_pasteboard(&pb);
                let candidate = if resumed {
                    // Fresh start or resume: changes made meanwhile are not history
                    poller.prime(&mut *guard);
                    None
                } else {
                    poller.tick(&mut *guard)
                };
                (poller, candidate)
            })
            .await;

            let candidate = match sampled {
                Ok((next, candidate)) => {
                    poller = next;
                    candidate
                }
                Err(e) => {
                    log::error!("Clipboard poll task failed: {}", e);
                    break;
                }
            };

            if let Some(text) = candidate {
                log::debug!("Detected clipboard change ({} chars)", text.len());
                if tx.send(Event::ClipboardChanged { text }).await.is_err() {
                    log::debug!("State loop gone, stopping clipboard polling");
                    break;
                }
            }
        }
        was_enabled = is_enabled;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(poller.next_delay(interval)) => {}
        }
    }

    log::info!("Clipboard polling stopped");
}
