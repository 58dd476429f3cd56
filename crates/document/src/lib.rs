use thiserror::Error;

mod records;
pub use records::*;
mod diff;
pub use diff::*;
mod store;
pub use store::*;
mod history;
pub use history::*;
mod geometry;
pub use geometry::*;
mod editor;
pub use editor::*;
pub mod pacing;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("page already exists: {0}")]
    PageExists(PageId),
    #[error("page not found: {0}")]
    PageNotFound(PageId),
    #[error("shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("page limit of {limit} reached")]
    PageLimitReached { limit: usize },
    #[error("document is read-only")]
    Readonly,
    #[error("unsupported schema version {found} (newest known is {supported})")]
    SchemaMismatch { found: u32, supported: u32 },
    #[error("history empty: {0}")]
    HistoryEmpty(&'static str),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
