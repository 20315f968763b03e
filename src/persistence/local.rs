//! Local item slot.
//!
//! The whole item array lives in one JSON file:
//! ```text
//! <DATA_DIR>/
//!   shoppingList.v1.json
//! ```
//!
//! The slot is read once at startup and overwritten after every mutation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::Item;

/// Name of the slot holding the item array.
pub const SLOT_KEY: &str = "shoppingList.v1";

/// Errors that can occur while writing the slot.
#[derive(Debug)]
pub enum LocalSlotError {
    /// I/O error writing the file or its directory.
    IoError(PathBuf, io::Error),
    /// Error serializing the items.
    SerializeError(serde_json::Error),
}

impl std::fmt::Display for LocalSlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalSlotError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            LocalSlotError::SerializeError(e) => {
                write!(f, "Failed to serialize items: {}", e)
            }
        }
    }
}

impl std::error::Error for LocalSlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LocalSlotError::IoError(_, e) => Some(e),
            LocalSlotError::SerializeError(e) => Some(e),
        }
    }
}

/// File-backed key-value slot for the local variant.
#[derive(Debug, Clone)]
pub struct LocalSlot {
    path: PathBuf,
}

impl LocalSlot {
    /// Creates a slot inside `data_dir`. Nothing is touched on disk yet.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{}.json", SLOT_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved items.
    ///
    /// A missing or unreadable slot yields an empty list.
    pub fn load(&self) -> Vec<Item> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed slot {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrites the slot with `items`.
    pub fn save(&self, items: &[Item]) -> Result<(), LocalSlotError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| LocalSlotError::IoError(dir.to_path_buf(), e))?;
        }

        let json = serde_json::to_string(items).map_err(LocalSlotError::SerializeError)?;

        // Write atomically using temp file + rename
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|e| LocalSlotError::IoError(temp_path.clone(), e))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| LocalSlotError::IoError(self.path.clone(), e))?;

        tracing::debug!("Saved {} item(s) to {}", items.len(), self.path.display());
        Ok(())
    }
}
