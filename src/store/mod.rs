//! Flat JSON files for notes, bookmarks and reading history.
//!
//! Nothing is cached: every operation reads the whole file, changes it and
//! writes it back, so two processes sharing a data directory see each
//! other's changes (last writer wins).

mod bookmarks;
mod history;
mod notes;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use bookmarks::{Bookmark, BookmarkStore};
pub use history::{HISTORY_LIMIT, HistoryEntry, HistoryStore, Position};
pub use notes::{Note, NoteStore};

pub const NOTES_FILENAME: &str = "notes.json";
pub const BOOKMARKS_FILENAME: &str = "bookmarks.json";
pub const HISTORY_FILENAME: &str = "history.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no document path given")]
    EmptyKey,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Read a JSON file; a missing or blank file is the default value
pub(crate) fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace a JSON file with the pretty-printed value
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(value)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }
    fs::write(path, content).map_err(write_err)?;
    debug!("Wrote {path:?}");
    Ok(())
}

/// An entry kept per document
pub trait Entry: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> u64;
}

/// Millisecond timestamp id, bumped past any id already taken
pub fn next_id<T: Entry>(existing: &[T]) -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let max = existing.iter().map(Entry::id).max().unwrap_or(0);
    now.max(max + 1)
}

/// Lists of entries keyed by absolute document path, in one JSON file
pub struct DocumentStore<T> {
    file_path: PathBuf,
    _entry: std::marker::PhantomData<T>,
}

impl<T: Entry> DocumentStore<T> {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            _entry: std::marker::PhantomData,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Vec<T>>, StoreError> {
        read_json(&self.file_path)
    }

    /// Entries of one document (empty if it has none)
    pub fn load(&self, doc: &str) -> Result<Vec<T>, StoreError> {
        check_key(doc)?;
        Ok(self.read_all()?.remove(doc).unwrap_or_default())
    }

    /// Replace a document's entries; an empty list removes the key
    pub fn save(&self, doc: &str, entries: &[T]) -> Result<(), StoreError> {
        check_key(doc)?;
        let mut all = self.read_all()?;
        if entries.is_empty() {
            all.remove(doc);
        } else {
            all.insert(doc.to_string(), entries.to_vec());
        }
        write_json(&self.file_path, &all)
    }

    /// Append one entry and return the document's updated list
    pub fn add(&self, doc: &str, entry: T) -> Result<Vec<T>, StoreError> {
        check_key(doc)?;
        let mut all = self.read_all()?;
        let entries = all.entry(doc.to_string()).or_default();
        entries.push(entry);
        let updated = entries.clone();
        write_json(&self.file_path, &all)?;
        Ok(updated)
    }

    /// Remove an entry by id and return the document's updated list
    pub fn delete(&self, doc: &str, id: u64) -> Result<Vec<T>, StoreError> {
        check_key(doc)?;
        let mut all = self.read_all()?;
        let Some(entries) = all.get_mut(doc) else {
            return Ok(Vec::new());
        };
        entries.retain(|e| e.id() != id);
        let updated = entries.clone();
        if updated.is_empty() {
            all.remove(doc);
        }
        write_json(&self.file_path, &all)?;
        Ok(updated)
    }
}

fn check_key(doc: &str) -> Result<(), StoreError> {
    if doc.trim().is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(())
}

/// All stores of one data directory
pub struct Stores {
    pub notes: NoteStore,
    pub bookmarks: BookmarkStore,
    pub history: HistoryStore,
}

impl Stores {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            notes: NoteStore::new(data_dir.join(NOTES_FILENAME)),
            bookmarks: BookmarkStore::new(data_dir.join(BOOKMARKS_FILENAME)),
            history: HistoryStore::new(data_dir.join(HISTORY_FILENAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_and_blank_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.json");
        let map: BTreeMap<String, Vec<Note>> = read_json(&path).unwrap();
        assert!(map.is_empty());
        fs::write(&path, "  \n").unwrap();
        let map: BTreeMap<String, Vec<Note>> = read_json(&path).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, "[1,").unwrap();
        let err = read_json::<BTreeMap<String, Vec<Note>>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn writes_use_two_space_indent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("x.json");
        let mut map = BTreeMap::new();
        map.insert("k", vec![1]);
        write_json(&path, &map).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"k\": [\n    1\n  ]\n}");
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let taken = vec![Note::new(u64::MAX - 1, "a", "b")];
        assert_eq!(next_id(&taken), u64::MAX);
        assert!(next_id::<Note>(&[]) > 1_600_000_000_000);
    }

    #[test]
    fn empty_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = NoteStore::new(dir.path().join(NOTES_FILENAME));
        assert!(matches!(store.load(""), Err(StoreError::EmptyKey)));
        assert!(!store.file_path().exists());
    }
}
