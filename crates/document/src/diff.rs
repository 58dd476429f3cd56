use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Record, RecordId};

/// Where a change came from. Replayed and loaded changes are `Remote` so that
/// listeners interested in user edits can skip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    User,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeScope {
    /// Persistent document records.
    Document,
    /// Per-session state: current page, camera, instance flags.
    Session,
}

/// One store mutation, partitioned into disjoint added/updated/removed sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsDiff {
    #[serde(default)]
    pub added: BTreeMap<RecordId, Record>,
    #[serde(default)]
    pub updated: BTreeMap<RecordId, (Record, Record)>,
    #[serde(default)]
    pub removed: BTreeMap<RecordId, Record>,
}

impl RecordsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    /// Folds a put of `next` (replacing `prev`, if any) into this diff.
    pub fn record_put(&mut self, prev: Option<Record>, next: Record) {
        let id = next.id();
        if let Some(added) = self.added.get_mut(&id) {
            *added = next;
        } else if let Some((_, after)) = self.updated.get_mut(&id) {
            *after = next;
        } else if let Some(before) = self.removed.remove(&id) {
            if before != next {
                self.updated.insert(id, (before, next));
            }
        } else {
            match prev {
                Some(before) if before == next => {}
                Some(before) => {
                    self.updated.insert(id, (before, next));
                }
                None => {
                    self.added.insert(id, next);
                }
            }
        }
    }

    /// Folds a removal of `record` into this diff.
    pub fn record_remove(&mut self, record: Record) {
        let id = record.id();
        if self.added.remove(&id).is_some() {
            return;
        }
        if let Some((before, _)) = self.updated.remove(&id) {
            self.removed.insert(id, before);
        } else {
            self.removed.insert(id, record);
        }
    }

    /// Appends `other`, which happened after `self`, squashing per record.
    pub fn squash(&mut self, other: RecordsDiff) {
        for (_, record) in other.added {
            self.record_put(None, record);
        }
        for (_, (before, after)) in other.updated {
            self.record_put(Some(before), after);
        }
        for (_, record) in other.removed {
            self.record_remove(record);
        }
    }

    /// The diff that undoes this one.
    pub fn inverse(&self) -> RecordsDiff {
        RecordsDiff {
            added: self.removed.clone(),
            updated: self
                .updated
                .iter()
                .map(|(id, (before, after))| (id.clone(), (after.clone(), before.clone())))
                .collect(),
            removed: self.added.clone(),
        }
    }
}

/// What a store listener receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeBatch {
    pub changes: RecordsDiff,
    pub source: ChangeSource,
    pub scope: ChangeScope,
}
