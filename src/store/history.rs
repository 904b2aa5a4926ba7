use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::{StoreError, read_json, write_json};
use crate::document::{DocumentKind, DocumentRef};

/// Most entries kept in the history file
pub const HISTORY_LIMIT: usize = 50;

/// Where the reader left off in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Page of a PDF (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default)]
    pub scroll_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub file_path: String,
    pub file_name: String,
    pub file_type: DocumentKind,
    pub opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_position: Option<Position>,
}

impl HistoryEntry {
    pub fn for_document(doc: &DocumentRef) -> Self {
        Self {
            file_path: doc.key(),
            file_name: doc.name.clone(),
            file_type: doc.kind,
            opened_at: Utc::now(),
            last_position: None,
        }
    }
}

/// Recently opened documents, newest first
pub struct HistoryStore {
    file_path: PathBuf,
}

impl HistoryStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        read_json(&self.file_path)
    }

    pub fn get(&self, file_path: &str) -> Result<Option<HistoryEntry>, StoreError> {
        Ok(self.list()?.into_iter().find(|e| e.file_path == file_path))
    }

    /// Put an entry at the front, replacing any entry for the same path.
    ///
    /// A previous `lastPosition` is carried over when the new entry has none.
    pub fn record_open(&self, mut entry: HistoryEntry) -> Result<Vec<HistoryEntry>, StoreError> {
        if entry.file_path.trim().is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let mut entries = self.list()?;
        if let Some(idx) = entries.iter().position(|e| e.file_path == entry.file_path) {
            let previous = entries.remove(idx);
            if entry.last_position.is_none() {
                entry.last_position = previous.last_position;
            }
        }
        entries.insert(0, entry);
        if entries.len() > HISTORY_LIMIT {
            debug!("History over limit, dropping {} entries", entries.len() - HISTORY_LIMIT);
            entries.truncate(HISTORY_LIMIT);
        }
        write_json(&self.file_path, &entries)?;
        Ok(entries)
    }

    /// Remember the reading position of a document already in the history
    pub fn update_position(&self, file_path: &str, position: Position) -> Result<bool, StoreError> {
        let mut entries = self.list()?;
        let Some(entry) = entries.iter_mut().find(|e| e.file_path == file_path) else {
            return Ok(false);
        };
        entry.last_position = Some(position);
        write_json(&self.file_path, &entries)?;
        Ok(true)
    }

    pub fn remove(&self, file_path: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.list()?;
        entries.retain(|e| e.file_path != file_path);
        write_json(&self.file_path, &entries)?;
        Ok(entries)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        write_json::<Vec<HistoryEntry>>(&self.file_path, &Vec::new())
    }
}
