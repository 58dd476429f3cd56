/// User-directed export of snapshot files
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::{Result, SnapshotError, FILE_EXTENSION};

/// What the save mechanism is asked to do with the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Suggested file name, including extension
    pub file_name: String,

    /// Extensions the save dialog should offer
    pub extensions: Vec<String>,
}

impl SaveRequest {
    /// `<deck id>.inkdeck`, or `untitled.inkdeck` for anonymous decks
    pub fn for_deck(deck_id: Option<&str>) -> Self {
        Self {
            file_name: format!("{}{}", deck_id.unwrap_or("untitled"), FILE_EXTENSION),
            extensions: vec![FILE_EXTENSION.to_string()],
        }
    }
}

/// Save mechanism for exported snapshots
#[async_trait]
pub trait FileSaver: Send + Sync {
    /// Stores `bytes` and returns where they ended up
    async fn save(&self, bytes: Vec<u8>, request: SaveRequest) -> Result<PathBuf>;
}

/// Saves into a fixed directory under the suggested name
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl FileSaver for DirectorySaver {
    async fn save(&self, bytes: Vec<u8>, request: SaveRequest) -> Result<PathBuf> {
        if request.file_name.contains(['/', '\\']) {
            return Err(SnapshotError::Invalid(format!(
                "file name {:?} must not contain path separators",
                request.file_name
            )));
        }

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&request.file_name);
        fs::write(&path, bytes).await?;
        Ok(path)
    }
}
