pub mod clipboard;
pub mod debounce;
pub mod effects;
pub mod history;
pub mod hotkey;
mod presenter;
pub mod settings;
pub mod state_machine;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use clipboard::{PollerHandle, SharedPasteboard, SystemPasteboard, POLL_INTERVAL};
use debounce::{Debouncer, PERSIST_DEBOUNCE, PERSIST_MAX_DELAY};
use effects::{EffectRunner, SystemEffectRunner};
use history::ClipboardEntry;
use hotkey::{HotkeyStatus, KeyEventSource, KeySourceError};
use settings::{Config, JsonFileStore, MemoryStore, SettingsStore};
use state_machine::{reduce, Effect, Event, State, UiEvent};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const UI_CHANNEL_CAPACITY: usize = 64;

/// Read-only view of the state, republished after every change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<ClipboardEntry>,
    pub config: Config,
    pub recording_hotkey: bool,
}

impl Snapshot {
    fn of(state: &State) -> Self {
        Self {
            entries: state.history.entries().to_vec(),
            config: state.config,
            recording_hotkey: state.recorder.is_recording(),
        }
    }
}

/// Handle used by the presentation layer to drive the state loop
#[derive(Clone)]
pub struct ClipHandle {
    tx: mpsc::Sender<Event>,
    ui: broadcast::Sender<UiEvent>,
    snapshot: watch::Receiver<Snapshot>,
}

impl ClipHandle {
    /// Send an event to the state machine
    pub async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.tx.send(event).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::Delete { id: id.to_string() }).await
    }

    /// Put the entry back on the clipboard and drop it from history.
    /// The poller records it again at the front on its next tick.
    pub async fn copy_and_consume(&self, id: &str) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::CopyAndConsume { id: id.to_string() })
            .await
    }

    pub async fn clear(&self) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::Clear).await
    }

    pub async fn set_max_items(&self, n: usize) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::SetMaxItems(n)).await
    }

    pub async fn start_hotkey_recording(&self) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::StartHotkeyRecording).await
    }

    pub async fn cancel_hotkey_recording(&self) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::CancelHotkeyRecording).await
    }

    pub async fn toggle_presentation(&self) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::TogglePresentation).await
    }

    /// Flush pending history and stop the state loop
    pub async fn exit(&self) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(Event::Exit).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Resolves once the state loop has ended
    pub async fn closed(&self) {
        let mut snapshot = self.snapshot.clone();
        while snapshot.changed().await.is_ok() {}
    }
}

/// Run the main state loop. Returns the final state after `Event::Exit`.
async fn run_state_loop(
    mut state: State,
    mut rx: mpsc::Receiver<Event>,
    effect_runner: Arc<dyn EffectRunner>,
    ui: broadcast::Sender<UiEvent>,
    snapshot: watch::Sender<Snapshot>,
) -> State {
    log::info!(
        "State loop started ({} entries, max_items={}, hotkey={})",
        state.history.len(),
        state.config.max_items,
        state.config.hotkey
    );

    while let Some(event) = rx.recv().await {
        match &event {
            // Clipboard text stays out of debug logs
            Event::ClipboardChanged { text } => {
                log::debug!("Received event: ClipboardChanged ({} chars)", text.len())
            }
            other => log::debug!("Received event: {:?}", other),
        }

        let exiting = matches!(event, Event::Exit);
        let effects = reduce(&mut state, event);

        if !effects.is_empty() {
            snapshot.send_replace(Snapshot::of(&state));
        }

        for eff in effects {
            match eff {
                Effect::Emit(ui_event) => {
                    // No subscribers is fine
                    let _ = ui.send(ui_event);
                }
                other => effect_runner.run(other),
            }
        }

        if exiting {
            log::info!("Exit requested, shutting down state loop");
            break;
        }
    }

    log::info!("State loop ended");
    state
}

/// Everything the core needs from the outside world
pub struct Services {
    pub store: Arc<dyn SettingsStore>,
    pub pasteboard: SharedPasteboard,
    pub key_source: Box<dyn KeyEventSource>,
    pub poll_interval: Duration,
    pub persist_debounce: Duration,
    pub persist_max_delay: Duration,
}

impl Services {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        pasteboard: SharedPasteboard,
        key_source: Box<dyn KeyEventSource>,
    ) -> Self {
        Self {
            store,
            pasteboard,
            key_source,
            poll_interval: POLL_INTERVAL,
            persist_debounce: PERSIST_DEBOUNCE,
            persist_max_delay: PERSIST_MAX_DELAY,
        }
    }
}

/// A running clipboard history core
pub struct App {
    handle: ClipHandle,
    poller: PollerHandle,
    key_source: Box<dyn KeyEventSource>,
    hotkey_status: HotkeyStatus,
    state_loop: JoinHandle<State>,
}

impl App {
    /// Load persisted state and start every activity.
    /// Must be called from within a tokio runtime.
    pub fn start(services: Services) -> Self {
        let Services {
            store,
            pasteboard,
            mut key_source,
            poll_interval,
            persist_debounce,
            persist_max_delay,
        } = services;

        let config = Config::load(store.as_ref());
        let history = settings::load_history(store.as_ref(), config.max_items);
        let state = State::new(history, config);

        // Create event channel for state machine
        let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAPACITY);
        let (ui_tx, _) = broadcast::channel(UI_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::of(&state));

        let debouncer = Debouncer::spawn(tx.clone(), persist_debounce, persist_max_delay);
        let effect_runner: Arc<dyn EffectRunner> = Arc::new(SystemEffectRunner::new(
            pasteboard.clone(),
            store,
            debouncer,
        ));

        let state_loop = tokio::spawn(run_state_loop(
            state,
            rx,
            effect_runner,
            ui_tx.clone(),
            snapshot_tx,
        ));

        let poller = PollerHandle::spawn(pasteboard, tx.clone(), poll_interval);

        let hotkey_status = match key_source.start(tx.clone()) {
            Ok(status) => {
                log::info!(
                    "Key source started ({} devices)",
                    status.device_count
                );
                status
            }
            Err(KeySourceError::Unsupported) => {
                log::warn!("Global hotkey unavailable on this platform");
                hotkey::manager::failed_status(KeySourceError::Unsupported.to_string())
            }
            Err(e) => {
                // App continues without hotkey - the menu toggle still works
                log::error!("Failed to start key source: {}", e);
                hotkey::manager::failed_status(e.to_string())
            }
        };

        Self {
            handle: ClipHandle {
                tx,
                ui: ui_tx,
                snapshot: snapshot_rx,
            },
            poller,
            key_source,
            hotkey_status,
            state_loop,
        }
    }

    pub fn handle(&self) -> ClipHandle {
        self.handle.clone()
    }

    pub fn hotkey_status(&self) -> &HotkeyStatus {
        &self.hotkey_status
    }

    /// Pause/resume clipboard monitoring
    pub fn poller(&self) -> &PollerHandle {
        &self.poller
    }

    /// Stop all activities, flushing unsaved history. Returns the final state.
    pub async fn shutdown(mut self) -> Option<State> {
        self.poller.stop();
        self.key_source.stop();

        if self.handle.exit().await.is_err() {
            log::debug!("State loop already stopped");
        }

        match self.state_loop.await {
            Ok(state) => Some(state),
            Err(e) => {
                log::error!("State loop task failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Application entry point
// ============================================================================

/// Run the clipboard history against the system clipboard until interrupted
pub async fn run() {
    let store: Arc<dyn SettingsStore> = match settings::settings_path() {
        Ok(path) => {
            log::info!("Settings file: {}", path.display());
            Arc::new(JsonFileStore::open(path))
        }
        Err(e) => {
            log::warn!("{}; history will not survive a restart", e);
            Arc::new(MemoryStore::new())
        }
    };

    let services = Services::new(
        store,
        clipboard::shared(SystemPasteboard::new()),
        hotkey::default_source(),
    );
    let app = App::start(services);
    let handle = app.handle();

    tokio::spawn(presenter::run_presenter(handle.clone()));

    log::info!("Clip History started");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Failed to listen for interrupt: {}", e);
            }
            log::info!("Interrupt received");
        }
        _ = handle.closed() => {}
    }

    app.shutdown().await;
    log::info!("Clip History stopped");
}
