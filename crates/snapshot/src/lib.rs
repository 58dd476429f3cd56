//! Snapshot persistence for overlay documents.
//!
//! A snapshot is the whole store plus session state, stamped with the time it
//! was taken. Snapshots come from two places at startup (the fast local store
//! and an optional remote file) and the newer one wins.
use thiserror::Error;

mod snapshot;
pub use snapshot::*;

mod storage;
pub use storage::*;

mod remote;
pub use remote::*;

mod export;
pub use export::*;

mod coordinator;
pub use coordinator::*;

/// Suffix of exported snapshot files.
pub const FILE_EXTENSION: &str = ".inkdeck";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid snapshot: {0}")]
    Invalid(String),

    #[error(transparent)]
    Document(#[from] document::DocumentError),

    #[error("local storage unavailable: deck has no identifier")]
    NoDeckId,
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
