use document::pacing::Throttle;
use document::{Editor, Listener, ListenerFilter, Store};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    parse_optional_bool, DeckKeys, FileSaver, LocalStorage, RemoteSource, Result, SaveRequest,
    SnapshotError, TimestampedSnapshot,
};

/// Minimum spacing between two local snapshot writes.
pub const SAVE_THROTTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Local,
    Remote,
}

/// What `load_initial` ended up loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub source: Option<SnapshotSource>,
    pub timestamp: Option<i64>,
}

/// Picks the snapshot to load. The newer one wins; on a tie the local copy
/// is kept.
pub fn choose(
    local: Option<TimestampedSnapshot>,
    remote: Option<TimestampedSnapshot>,
) -> Option<(SnapshotSource, TimestampedSnapshot)> {
    match (local, remote) {
        (Some(local), Some(remote)) if remote.timestamp > local.timestamp => {
            Some((SnapshotSource::Remote, remote))
        }
        (Some(local), _) => Some((SnapshotSource::Local, local)),
        (None, Some(remote)) => Some((SnapshotSource::Remote, remote)),
        (None, None) => None,
    }
}

/// Loads the initial snapshot and keeps local storage in sync with the store.
pub struct PersistenceCoordinator<S: LocalStorage> {
    deck_id: Option<String>,
    keys: Option<DeckKeys>,
    storage: S,
    save_enabled: bool,
    throttle: Throttle,
    listener: Option<Listener>,
    ready: bool,
}

impl<S: LocalStorage> PersistenceCoordinator<S> {
    /// The stored preference wins over `default_enabled`. Without a deck id
    /// local persistence stays off.
    pub fn new(deck_id: Option<String>, storage: S, default_enabled: bool) -> Self {
        let keys = deck_id.as_deref().map(DeckKeys::new);
        let save_enabled = match &keys {
            Some(keys) => {
                let stored = storage.get(&keys.save_enabled).unwrap_or_else(|e| {
                    warn!("Failed to read local storage preference: {}", e);
                    None
                });
                parse_optional_bool(stored.as_deref()).unwrap_or(default_enabled)
            }
            None => false,
        };

        Self {
            deck_id,
            keys,
            storage,
            save_enabled,
            throttle: Throttle::new(SAVE_THROTTLE),
            listener: None,
            ready: false,
        }
    }

    pub fn deck_id(&self) -> Option<&str> {
        self.deck_id.as_deref()
    }

    pub fn can_use_local_storage(&self) -> bool {
        self.keys.is_some()
    }

    pub fn is_save_enabled(&self) -> bool {
        self.save_enabled
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads the local snapshot. Missing and unreadable data are both absence
    /// but are logged differently.
    pub fn read_local(&self) -> Option<TimestampedSnapshot> {
        let keys = self.keys.as_ref()?;
        let raw = match self.storage.get(&keys.snapshot) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No local snapshot stored under {}", keys.snapshot);
                return None;
            }
            Err(e) => {
                warn!("Failed to read local snapshot: {}", e);
                return None;
            }
        };
        match TimestampedSnapshot::parse(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Ignoring unreadable local snapshot {}: {}", keys.snapshot, e);
                None
            }
        }
    }

    /// Loads the newer of the local and remote snapshots into `editor`.
    /// Becomes ready whatever the outcome.
    pub async fn load_initial(
        &mut self,
        editor: &mut Editor,
        remote: Option<RemoteSource<'_>>,
    ) -> LoadOutcome {
        let (local, remote) = tokio::join!(async { self.read_local() }, async {
            match &remote {
                Some(source) => source.load().await,
                None => None,
            }
        });

        let mut outcome = LoadOutcome {
            source: None,
            timestamp: None,
        };
        if let Some((source, snapshot)) = choose(local, remote) {
            let timestamp = snapshot.timestamp;
            match snapshot.restore(editor) {
                Ok(()) => {
                    info!(?source, timestamp, "Loaded saved drawings");
                    outcome = LoadOutcome {
                        source: Some(source),
                        timestamp: Some(timestamp),
                    };
                }
                Err(e) => warn!(?source, "Failed to load saved drawings: {}", e),
            }
        }

        self.ready = true;
        if self.save_enabled {
            self.install_listener(editor.store_mut());
        }
        outcome
    }

    /// Persists the preference and installs or removes the store listener.
    pub fn set_save_enabled(&mut self, enabled: bool, store: &mut Store) -> Result<()> {
        let keys = self.keys.as_ref().ok_or(SnapshotError::NoDeckId)?;
        self.storage
            .set(&keys.save_enabled, if enabled { "true" } else { "false" })?;
        self.save_enabled = enabled;

        if enabled && self.ready {
            self.install_listener(store);
        } else if !enabled {
            self.remove_listener(store);
        }
        Ok(())
    }

    /// Drains pending store changes and saves, throttled.
    pub fn on_store_change(&mut self, editor: &Editor, now: Instant) {
        let Some(listener) = &self.listener else {
            return;
        };
        if listener.drain().is_empty() {
            return;
        }
        if self.throttle.call(now) {
            self.persist(editor);
        }
    }

    /// Runs a trailing save that came due.
    pub fn tick(&mut self, editor: &Editor, now: Instant) {
        if self.listener.is_some() && self.throttle.poll(now) {
            self.persist(editor);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Writes a freshly timestamped snapshot. Failures are only logged.
    pub fn persist(&mut self, editor: &Editor) {
        let Some(keys) = &self.keys else {
            return;
        };
        let snapshot = TimestampedSnapshot::capture_now(editor);
        let written = snapshot
            .to_json()
            .and_then(|json| self.storage.set(&keys.snapshot, &json));
        match written {
            Ok(()) => debug!(timestamp = snapshot.timestamp, "Saved drawings locally"),
            Err(e) => warn!("Failed to save drawings locally: {}", e),
        }
    }

    /// Serializes the current document and hands it to `saver`.
    pub async fn save_to_file(&self, editor: &Editor, saver: &dyn FileSaver) -> Result<PathBuf> {
        let json = TimestampedSnapshot::capture_now(editor).to_json()?;
        let request = SaveRequest::for_deck(self.deck_id());
        let path = saver.save(json.into_bytes(), request).await?;
        info!("Saved drawings to {}", path.display());
        Ok(path)
    }

    /// Turns local saving off and erases the stored snapshot.
    pub fn clear_local(&mut self, store: &mut Store) -> Result<()> {
        self.set_save_enabled(false, store)?;
        if let Some(keys) = &self.keys {
            self.storage.remove(&keys.snapshot)?;
        }
        self.throttle.cancel();
        Ok(())
    }

    pub fn teardown(&mut self, store: &mut Store) {
        self.remove_listener(store);
        self.throttle.cancel();
    }

    fn install_listener(&mut self, store: &mut Store) {
        if self.keys.is_none() || self.listener.is_some() {
            return;
        }
        self.listener = Some(store.listen(ListenerFilter::ALL));
    }

    fn remove_listener(&mut self, store: &mut Store) {
        if let Some(listener) = self.listener.take() {
            store.unlisten(listener.id());
        }
    }
}
