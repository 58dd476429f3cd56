use crate::{DocumentError, RecordsDiff, Result, Store};

/// Undo/redo stacks of committed user diffs.
#[derive(Debug, Default, Clone)]
pub struct UndoHistory {
    undo_stack: Vec<RecordsDiff>,
    redo_stack: Vec<RecordsDiff>,
}

impl UndoHistory {
    pub fn record(&mut self, diff: RecordsDiff) {
        if diff.is_empty() {
            return;
        }
        self.undo_stack.push(diff);
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, store: &mut Store) -> Result<()> {
        let diff = self
            .undo_stack
            .pop()
            .ok_or(DocumentError::HistoryEmpty("undo stack"))?;
        store.transact(|s| s.apply_diff(&diff.inverse()));
        self.redo_stack.push(diff);
        Ok(())
    }

    pub fn redo(&mut self, store: &mut Store) -> Result<()> {
        let diff = self
            .redo_stack
            .pop()
            .ok_or(DocumentError::HistoryEmpty("redo stack"))?;
        store.transact(|s| s.apply_diff(&diff));
        self.undo_stack.push(diff);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
