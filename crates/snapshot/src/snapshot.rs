use document::{Editor, EditorSnapshot, SessionState, StoreSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, SnapshotError};

/// Full document plus session state, stamped with milliseconds since epoch.
///
/// Serialized flat: `{ "timestamp": .., "store": {..}, "schema": {..},
/// "currentPageId": .., "camera": {..}, "instance": {..} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedSnapshot {
    pub timestamp: i64,
    #[serde(flatten)]
    pub document: StoreSnapshot,
    #[serde(flatten)]
    pub session: SessionState,
}

impl TimestampedSnapshot {
    pub fn capture(editor: &Editor, timestamp: i64) -> Self {
        let EditorSnapshot { document, session } = editor.snapshot();
        Self {
            timestamp,
            document,
            session,
        }
    }

    /// Captures `editor` stamped with the current wall-clock time.
    pub fn capture_now(editor: &Editor) -> Self {
        Self::capture(editor, chrono::Utc::now().timestamp_millis())
    }

    /// Parses and structurally validates a snapshot document.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        validate(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn restore(self, editor: &mut Editor) -> Result<()> {
        editor.load_snapshot(EditorSnapshot {
            document: self.document,
            session: self.session,
        })?;
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.document.store.len()
    }
}

/// A snapshot must carry a non-zero timestamp, the store content and the
/// schema markers.
pub fn validate(value: &Value) -> Result<()> {
    let object = value
        .as_object()
        .ok_or_else(|| SnapshotError::Invalid("not a JSON object".into()))?;

    let timestamp = object.get("timestamp").and_then(Value::as_f64);
    if !matches!(timestamp, Some(t) if t != 0.0) {
        return Err(SnapshotError::Invalid("missing timestamp".into()));
    }
    if !matches!(object.get("store"), Some(Value::Object(_))) {
        return Err(SnapshotError::Invalid("missing store".into()));
    }
    match object.get("schema") {
        None | Some(Value::Null) => Err(SnapshotError::Invalid("missing schema".into())),
        Some(_) => Ok(()),
    }
}
