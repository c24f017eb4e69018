//! Usage state store.
//!
//! A single owner task holds the [`LoadState`] and is the only code that
//! mutates it. Everything else talks to it through commands:
//!
//! ```text
//! UsageStateStore::load ──┐
//! file watcher ───────────┼─► owner task ──► watch::Sender<LoadState>
//! load cycle events ──────┘        │
//!                                  └─► spawns one load cycle at a time
//! ```
//!
//! Only one cycle runs at a time and it always runs to its terminal state.
//! Requests that arrive meanwhile collapse into a single follow-up cycle,
//! which is forced if any of them was. Each cycle carries a generation
//! number; events from a cycle that is no longer active are dropped.

use chrono::Utc;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warpbar_core::LoadError;
use warpbar_fetch::{
    FetchError, FileChangeWatcher, LoaderEvent, PlistSource, RetryingLoader, WatchEvent,
};

use crate::error::StoreError;
use crate::settings_store::Settings;
use crate::state::LoadState;

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug)]
enum StoreCommand {
    RequestLoad { force: bool },
    FileChanged,
    Cycle { generation: u64, event: CycleEvent },
    WatchFailed(FetchError),
    Shutdown,
}

#[derive(Debug)]
enum CycleEvent {
    /// The file's mtime has not advanced; nothing was read.
    Unchanged,
    /// Parsing is about to start against a file last modified at `modified`.
    Began { modified: Option<SystemTime> },
    Loader(LoaderEvent),
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to the usage state owner task.
///
/// Cloning is cheap. The owner task stops on [`shutdown`] or once every
/// handle is dropped.
///
/// [`shutdown`]: UsageStateStore::shutdown
#[derive(Debug, Clone)]
pub struct UsageStateStore {
    commands: mpsc::UnboundedSender<StoreCommand>,
    state: watch::Receiver<LoadState>,
}

impl UsageStateStore {
    /// Spawns the owner task on the current tokio runtime.
    ///
    /// With `watch_file`, a [`FileChangeWatcher`] on the loader's source path
    /// triggers forced loads. A failed watch is published as `watch_error`.
    pub fn spawn(loader: RetryingLoader, watch_file: bool) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let initial = LoadState {
            source_path: loader.source().path().map(std::path::Path::to_path_buf),
            ..LoadState::default()
        };
        let (state_tx, state_rx) = watch::channel(initial);

        let mut owner = StoreOwner {
            state: state_tx,
            loader,
            internal: internal_tx,
            generation: 0,
            active: None,
            follow_up: None,
            last_seen_modified: None,
            watcher: None,
        };
        if watch_file {
            owner.start_watcher();
        }
        tokio::spawn(owner.run(commands_rx, internal_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Builds the loader from settings, locating the preferences file once.
    pub fn from_settings(settings: &Settings) -> Self {
        let path = settings.locator().locate();
        if path.is_none() {
            warn!("No Warp preferences file found");
        }
        let source = Arc::new(PlistSource::new(path, settings.parser()));
        let loader = RetryingLoader::new(source, settings.retry_strategy());
        Self::spawn(loader, settings.watch_file)
    }

    /// Requests a load cycle.
    ///
    /// `force = false` is skipped when the file has not been modified since
    /// the last successful read. `force = true` always reads. A request made
    /// while a cycle is running waits for that cycle to finish.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ShutDown` once the owner task has stopped.
    pub fn load(&self, force: bool) -> Result<(), StoreError> {
        self.commands
            .send(StoreCommand::RequestLoad { force })
            .map_err(|_| StoreError::ShutDown)
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes. Only the latest value is kept.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.clone()
    }

    /// Stops the owner task, cancelling any cycle and releasing the watch.
    ///
    /// Resolves once the owner task has exited.
    pub async fn shutdown(&self) {
        if self.commands.send(StoreCommand::Shutdown).is_ok() {
            self.commands.closed().await;
        }
    }
}

// ============================================================================
// Owner Task
// ============================================================================

struct ActiveCycle {
    generation: u64,
    task: JoinHandle<()>,
    modified: Option<SystemTime>,
}

struct StoreOwner {
    state: watch::Sender<LoadState>,
    loader: RetryingLoader,
    internal: mpsc::UnboundedSender<StoreCommand>,
    generation: u64,
    active: Option<ActiveCycle>,
    /// Queued follow-up cycle and whether it is forced.
    follow_up: Option<bool>,
    last_seen_modified: Option<SystemTime>,
    watcher: Option<FileChangeWatcher>,
}

impl StoreOwner {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<StoreCommand>,
        mut internal: mpsc::UnboundedReceiver<StoreCommand>,
    ) {
        debug!("Usage store started");
        loop {
            let command = tokio::select! {
                biased;
                cmd = commands.recv() => cmd.unwrap_or(StoreCommand::Shutdown),
                Some(cmd) = internal.recv() => cmd,
            };
            if matches!(command, StoreCommand::Shutdown) {
                break;
            }
            self.handle(command);
        }
        self.stop();
    }

    fn handle(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::RequestLoad { force } => self.request(force),
            StoreCommand::FileChanged => {
                debug!("Preferences changed on disk");
                self.request(true);
            }
            StoreCommand::Cycle { generation, event } => self.on_cycle_event(generation, event),
            StoreCommand::WatchFailed(error) => {
                warn!(error = %error, "File watch failed");
                self.publish(|s| s.watch_error = Some(LoadError::from(error)));
            }
            StoreCommand::Shutdown => {}
        }
    }

    fn request(&mut self, force: bool) {
        if let Some(cycle) = &self.active {
            let force = force || self.follow_up.unwrap_or(false);
            debug!(running = cycle.generation, force, "Load already running, queued follow-up");
            self.follow_up = Some(force);
        } else {
            self.start_cycle(force);
        }
    }

    fn start_cycle(&mut self, force: bool) {
        self.generation += 1;
        let generation = self.generation;
        let loader = self.loader.clone();
        let events = self.internal.clone();
        let last_seen = self.last_seen_modified;

        let task = tokio::spawn(async move {
            let source = Arc::clone(loader.source());
            let modified = tokio::task::spawn_blocking(move || source.modified())
                .await
                .ok()
                .flatten();

            let send = |event| {
                let _ = events.send(StoreCommand::Cycle { generation, event });
            };

            if !force && matches!((modified, last_seen), (Some(m), Some(seen)) if m <= seen) {
                send(CycleEvent::Unchanged);
                return;
            }

            send(CycleEvent::Began { modified });
            let _ = loader.run(|event| send(CycleEvent::Loader(event))).await;
        });

        debug!(generation, force, "Load cycle started");
        self.active = Some(ActiveCycle {
            generation,
            task,
            modified: None,
        });
        if force {
            self.publish(|s| {
                s.is_loading = true;
                s.retry_attempt = 0;
            });
        }
    }

    fn on_cycle_event(&mut self, generation: u64, event: CycleEvent) {
        let Some(cycle) = self.active.as_mut().filter(|c| c.generation == generation) else {
            debug!(generation, "Dropping event from inactive cycle");
            return;
        };

        match event {
            CycleEvent::Unchanged => {
                debug!(generation, "Preferences unchanged, skipped");
                self.finish_cycle();
            }
            CycleEvent::Began { modified } => {
                cycle.modified = modified;
                self.publish(|s| {
                    s.is_loading = true;
                    s.retry_attempt = 0;
                });
            }
            CycleEvent::Loader(LoaderEvent::AttemptStarted { .. }) => {}
            CycleEvent::Loader(LoaderEvent::AttemptFailed { attempt, .. }) => {
                self.publish(|s| s.retry_attempt = attempt);
            }
            CycleEvent::Loader(LoaderEvent::Succeeded { snapshot, .. }) => {
                self.last_seen_modified = cycle.modified;
                self.publish(|s| {
                    s.snapshot = Some(snapshot);
                    s.last_error = None;
                    s.is_loading = false;
                    s.retry_attempt = 0;
                    s.last_update_time = Some(Utc::now());
                });
                self.finish_cycle();
            }
            CycleEvent::Loader(LoaderEvent::Exhausted { error }) => {
                self.publish(|s| {
                    s.last_error = Some(LoadError::from(error));
                    s.is_loading = false;
                    s.retry_attempt = 0;
                });
                self.finish_cycle();
            }
        }
    }

    fn finish_cycle(&mut self) {
        self.active = None;
        if let Some(force) = self.follow_up.take() {
            self.start_cycle(force);
        }
    }

    fn start_watcher(&mut self) {
        let Some(path) = self.loader.source().path().map(std::path::Path::to_path_buf) else {
            return;
        };

        let events = self.internal.clone();
        let result = FileChangeWatcher::start(&path, move |event| {
            let command = match event {
                WatchEvent::Changed => StoreCommand::FileChanged,
                WatchEvent::Failed(e) => StoreCommand::WatchFailed(e),
            };
            let _ = events.send(command);
        });

        match result {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => {
                warn!(error = %e, "Continuing without file watch");
                self.publish(|s| s.watch_error = Some(LoadError::from(e)));
            }
        }
    }

    fn stop(&mut self) {
        if let Some(cycle) = self.active.take() {
            cycle.task.abort();
        }
        self.follow_up = None;
        if let Some(watcher) = self.watcher.take() {
            watcher.cancel();
        }
        self.publish(|s| {
            s.is_loading = false;
            s.retry_attempt = 0;
        });
        info!("Usage store stopped");
    }

    fn publish(&self, f: impl FnOnce(&mut LoadState)) {
        self.state.send_modify(f);
    }
}

// ============================================================================
// Tests
// ============================================================================
