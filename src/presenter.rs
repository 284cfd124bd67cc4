//! Headless presentation: writes the history to the log when toggled

use tokio::sync::broadcast::error::RecvError;

use crate::state_machine::UiEvent;
use crate::ClipHandle;

const PREVIEW_CHARS: usize = 60;

/// One-line preview of an entry
fn preview(content: &str, max_chars: usize) -> String {
    let flat: String = content
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();

    if flat.chars().count() <= max_chars {
        return flat.to_string();
    }
    let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub(crate) async fn run_presenter(handle: ClipHandle) {
    let mut events = handle.subscribe();
    let mut visible = false;

    loop {
        match events.recv().await {
            Ok(UiEvent::TogglePresentation) => {
                visible = !visible;
                if visible {
                    let snapshot = handle.snapshot();
                    log::info!("History ({} entries):", snapshot.entries.len());
                    for (i, entry) in snapshot.entries.iter().enumerate() {
                        log::info!("  {:>3}. {}", i + 1, preview(&entry.content, PREVIEW_CHARS));
                    }
                } else {
                    log::info!("History hidden");
                }
            }
            Ok(UiEvent::HistoryChanged(entries)) if visible => {
                log::info!("History now has {} entries", entries.len());
            }
            Ok(UiEvent::HotkeyRecorded(hotkey)) => log::info!("New hotkey: {}", hotkey),
            Ok(_) => {}
            Err(RecvError::Lagged(n)) => log::warn!("Presenter skipped {} events", n),
            Err(RecvError::Closed) => break,
        }
    }
}
