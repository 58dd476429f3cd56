//! Drawing overlay for slide presentations.
//!
//! Each slide gets its own document page, named after the slide. The
//! [`Overlay`] controller ties the presentation's events to page switching,
//! viewport locking, snapshot persistence and history scrubbing.
use document::DocumentError;
use snapshot::SnapshotError;
use thiserror::Error;

mod presentation;
pub use presentation::*;
mod deck;
pub use deck::*;
mod identity;
pub use identity::*;
mod viewport;
pub use viewport::*;
mod lifecycle;
pub use lifecycle::*;
mod scrubber;
pub use scrubber::*;
mod actions;
pub use actions::*;
mod config;
pub use config::*;
mod input;
pub use input::*;
mod controller;
pub use controller::*;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("page limit of {limit} reached, slide {key} has no page")]
    PageLimitReached { key: PageKey, limit: usize },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("{0} is not available")]
    Unavailable(&'static str),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
