use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    ChangeBatch, ChangeScope, ChangeSource, DocumentError, PageId, Record, RecordId, RecordType,
    RecordsDiff, Result, ShapeRecord,
};

pub const SCHEMA_VERSION: u32 = 2;

/// Version markers written next to the records of every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMarker {
    pub schema_version: u32,
    #[serde(default)]
    pub record_versions: BTreeMap<String, u32>,
}

impl Default for SchemaMarker {
    fn default() -> Self {
        let record_versions = [("page", 1), ("shape", 1), ("asset", 1)]
            .into_iter()
            .map(|(name, version)| (name.to_string(), version))
            .collect();
        Self {
            schema_version: SCHEMA_VERSION,
            record_versions,
        }
    }
}

/// The document half of a snapshot: every record plus the schema it was
/// written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub store: BTreeMap<RecordId, Record>,
    pub schema: SchemaMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Which batches a listener wants. `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerFilter {
    pub source: Option<ChangeSource>,
    pub scope: Option<ChangeScope>,
}

impl ListenerFilter {
    pub const ALL: ListenerFilter = ListenerFilter {
        source: None,
        scope: None,
    };

    pub fn new(source: Option<ChangeSource>, scope: Option<ChangeScope>) -> Self {
        Self { source, scope }
    }

    pub fn user_document() -> Self {
        Self::new(Some(ChangeSource::User), Some(ChangeScope::Document))
    }

    fn matches(&self, batch: &ChangeBatch) -> bool {
        self.source.map_or(true, |s| s == batch.source)
            && self.scope.map_or(true, |s| s == batch.scope)
    }
}

/// Receiving end of a store subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Listener {
    id: ListenerId,
    rx: Receiver<ChangeBatch>,
}

impl Listener {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Takes every batch delivered so far without blocking.
    pub fn drain(&self) -> Vec<ChangeBatch> {
        self.rx.try_iter().collect()
    }
}

struct ListenerEntry {
    id: ListenerId,
    filter: ListenerFilter,
    tx: Sender<ChangeBatch>,
}

struct Transaction {
    source: ChangeSource,
    diff: RecordsDiff,
}

/// In-memory record store with origin-tagged change notification.
#[derive(Default)]
pub struct Store {
    records: BTreeMap<RecordId, Record>,
    schema: SchemaMarker,
    listeners: Vec<ListenerEntry>,
    next_listener: u64,
    transaction: Option<Transaction>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("records", &self.records.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all_records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn records_of_type(&self, kind: RecordType) -> impl Iterator<Item = &Record> {
        self.records
            .values()
            .filter(move |record| record.record_type() == kind)
    }

    pub fn shapes_on_page<'a>(
        &'a self,
        page_id: &'a PageId,
    ) -> impl Iterator<Item = &'a ShapeRecord> + 'a {
        self.records
            .values()
            .filter_map(Record::as_shape)
            .filter(move |shape| &shape.parent_id == page_id)
    }

    /// Inserts or overwrites records.
    pub fn put(&mut self, records: impl IntoIterator<Item = Record>) {
        let mut diff = RecordsDiff::default();
        for record in records {
            let prev = self.records.insert(record.id(), record.clone());
            diff.record_put(prev, record);
        }
        self.commit(diff);
    }

    /// Removes records by id. Unknown ids are ignored.
    pub fn remove(&mut self, ids: impl IntoIterator<Item = RecordId>) {
        let mut diff = RecordsDiff::default();
        for id in ids {
            if let Some(record) = self.records.remove(&id) {
                diff.record_remove(record);
            }
        }
        self.commit(diff);
    }

    /// Applies a diff forward.
    pub fn apply_diff(&mut self, diff: &RecordsDiff) {
        self.put(diff.added.values().cloned());
        self.put(diff.updated.values().map(|(_, after)| after.clone()));
        self.remove(diff.removed.keys().cloned());
    }

    /// Runs `f` as one batch: listeners see a single squashed diff, which is
    /// also returned. Nested calls join the outer batch and return an empty
    /// diff.
    pub fn transact<R>(&mut self, f: impl FnOnce(&mut Store) -> R) -> (R, RecordsDiff) {
        self.transact_as(ChangeSource::User, f)
    }

    /// Like [`Store::transact`], but tags the batch as a remote change.
    pub fn merge_remote_changes<R>(&mut self, f: impl FnOnce(&mut Store) -> R) -> R {
        self.transact_as(ChangeSource::Remote, f).0
    }

    fn transact_as<R>(
        &mut self,
        source: ChangeSource,
        f: impl FnOnce(&mut Store) -> R,
    ) -> (R, RecordsDiff) {
        if self.transaction.is_some() {
            return (f(self), RecordsDiff::default());
        }
        self.transaction = Some(Transaction {
            source,
            diff: RecordsDiff::default(),
        });
        let result = f(self);
        let diff = self
            .transaction
            .take()
            .map(|tx| tx.diff)
            .unwrap_or_default();
        if !diff.is_empty() {
            self.emit(ChangeBatch {
                changes: diff.clone(),
                source,
                scope: ChangeScope::Document,
            });
        }
        (result, diff)
    }

    fn commit(&mut self, diff: RecordsDiff) {
        if diff.is_empty() {
            return;
        }
        match self.transaction.as_mut() {
            Some(tx) => tx.diff.squash(diff),
            None => self.emit(ChangeBatch {
                changes: diff,
                source: ChangeSource::User,
                scope: ChangeScope::Document,
            }),
        }
    }

    /// Tells listeners that session state changed. Session state lives
    /// outside the record map, so the batch carries an empty diff.
    pub fn notify_session(&mut self, source: ChangeSource) {
        let source = self.transaction.as_ref().map_or(source, |tx| tx.source);
        self.emit(ChangeBatch {
            changes: RecordsDiff::default(),
            source,
            scope: ChangeScope::Session,
        });
    }

    pub fn listen(&mut self, filter: ListenerFilter) -> Listener {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        let (tx, rx) = crossbeam_channel::unbounded();
        self.listeners.push(ListenerEntry { id, filter, tx });
        debug!(?id, ?filter, "store listener installed");
        Listener { id, rx }
    }

    pub fn unlisten(&mut self, id: ListenerId) {
        self.listeners.retain(|entry| entry.id != id);
        debug!(?id, "store listener removed");
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn emit(&mut self, batch: ChangeBatch) {
        // Sends fail once the Listener was dropped; prune those entries.
        self.listeners.retain(|entry| {
            if !entry.filter.matches(&batch) {
                return true;
            }
            entry.tx.send(batch.clone()).is_ok()
        });
    }

    pub fn schema(&self) -> &SchemaMarker {
        &self.schema
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            store: self.records.clone(),
            schema: self.schema.clone(),
        }
    }

    /// Replaces the whole content with `snapshot`, emitted as a remote change.
    pub fn load_snapshot(&mut self, snapshot: StoreSnapshot) -> Result<()> {
        if snapshot.schema.schema_version > SCHEMA_VERSION {
            return Err(DocumentError::SchemaMismatch {
                found: snapshot.schema.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        self.merge_remote_changes(|store| {
            let stale: Vec<RecordId> = store
                .records
                .keys()
                .filter(|id| !snapshot.store.contains_key(*id))
                .cloned()
                .collect();
            store.remove(stale);
            store.put(snapshot.store.into_values());
        });
        Ok(())
    }
}
