//! Debounced persistence trigger
//!
//! Every history mutation pokes the debouncer. One timer is rearmed on each
//! poke; when it elapses the state loop receives `Event::PersistDue` and
//! writes a single snapshot. A steady stream of pokes cannot postpone the
//! write past `max_delay` after the first unflushed poke.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::state_machine::Event;

/// Quiet period before a burst of changes is written
pub const PERSIST_DEBOUNCE: Duration = Duration::from_secs(1);
/// Upper bound between the first unflushed change and its write
pub const PERSIST_MAX_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct Debouncer {
    poke: Arc<Notify>,
    cancel: CancellationToken,
}

impl Debouncer {
    /// Spawn the timer task
    pub fn spawn(tx: mpsc::Sender<Event>, delay: Duration, max_delay: Duration) -> Self {
        let poke = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        tokio::spawn(run_debouncer(
            poke.clone(),
            cancel.clone(),
            tx,
            delay,
            max_delay.max(delay),
        ));

        Self { poke, cancel }
    }

    /// (Re)arm the timer
    pub fn poke(&self) {
        self.poke.notify_one();
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_debouncer(
    poke: Arc<Notify>,
    cancel: CancellationToken,
    tx: mpsc::Sender<Event>,
    delay: Duration,
    max_delay: Duration,
) {
    loop {
        // Idle until the first change
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = poke.notified() => {}
        }

        let first = Instant::now();
        let deadline = first + max_delay;
        let mut fire_at = first + delay;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep_until(fire_at.min(deadline)) => break,
                _ = poke.notified() => {
                    fire_at = Instant::now() + delay;
                }
            }
        }

        log::trace!("Persist due after {:?}", first.elapsed());
        if tx.send(Event::PersistDue).await.is_err() {
            return;
        }
    }
}
