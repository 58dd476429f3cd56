use document::{Editor, Listener, ListenerFilter, RecordsDiff, Store};
use tracing::debug;

/// Pointer value of the live document.
pub const POINTER_MAX: u32 = 10_000;

/// Time travel through the edits made while the scrubber is active.
///
/// The pointer moves over `0..=POINTER_MAX`. Moving it replays or reverts the
/// logged diffs between the old and the new position directly on the store,
/// as remote changes, so the replay itself is never logged.
#[derive(Debug)]
pub struct HistoryScrubber {
    log: Vec<RecordsDiff>,
    pointer: u32,
    listener: Option<Listener>,
}

impl Default for HistoryScrubber {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            pointer: POINTER_MAX,
            listener: None,
        }
    }
}

impl HistoryScrubber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, store: &mut Store) {
        if self.listener.is_none() {
            self.listener = Some(store.listen(ListenerFilter::user_document()));
        }
    }

    pub fn deactivate(&mut self, store: &mut Store) {
        self.capture();
        if let Some(listener) = self.listener.take() {
            store.unlisten(listener.id());
        }
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    /// Moves delivered user edits into the log.
    pub fn capture(&mut self) {
        if let Some(listener) = &self.listener {
            self.log
                .extend(listener.drain().into_iter().map(|batch| batch.changes));
        }
    }

    pub fn log(&self) -> &[RecordsDiff] {
        &self.log
    }

    pub fn pointer(&self) -> u32 {
        self.pointer
    }

    /// Moves the pointer to `value` (clamped to `POINTER_MAX`) and rebuilds
    /// the matching document state. Anywhere below the maximum the editor is
    /// read-only.
    pub fn set_pointer(&mut self, editor: &mut Editor, value: u32) {
        self.capture();
        let value = value.min(POINTER_MAX);
        let prev = log_index(self.pointer, self.log.len());
        let next = log_index(value, self.log.len());

        let readonly = value < POINTER_MAX;
        if editor.instance_state().is_readonly != readonly {
            editor.update_instance_state(|state| state.is_readonly = readonly);
        }
        self.pointer = value;

        let log = &self.log;
        editor.store_mut().merge_remote_changes(|store| {
            if next > prev {
                for diff in (prev..=next).filter_map(|i| log.get(i)) {
                    store.apply_diff(diff);
                }
            } else if next < prev {
                for diff in (next..=prev).rev().filter_map(|i| log.get(i)) {
                    store.apply_diff(&diff.inverse());
                }
            }
        });
        debug!(pointer = value, prev, next, entries = log.len(), "scrubbed history");
    }
}

/// `ceil(pointer / POINTER_MAX * len)` without floating point.
fn log_index(pointer: u32, len: usize) -> usize {
    let scaled = pointer as u64 * len as u64;
    scaled.div_ceil(POINTER_MAX as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_rounds_up() {
        assert_eq!(log_index(0, 7), 0);
        assert_eq!(log_index(POINTER_MAX, 7), 7);
        assert_eq!(log_index(1, 7), 1);
        assert_eq!(log_index(5_000, 3), 2);
        assert_eq!(log_index(5_000, 4), 2);
        assert_eq!(log_index(POINTER_MAX, 0), 0);
    }

    #[test]
    fn starts_live() {
        let scrubber = HistoryScrubber::new();
        assert_eq!(scrubber.pointer(), POINTER_MAX);
        assert!(!scrubber.is_active());
    }
}
