use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentStore, Entry};

/// A note attached to an excerpt of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Creation time in milliseconds
    pub id: u64,
    /// Excerpt the note refers to
    pub text: String,
    /// Body of the note
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Note {
    pub fn new(id: u64, text: &str, content: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl Entry for Note {
    fn id(&self) -> u64 {
        self.id
    }
}

pub type NoteStore = DocumentStore<Note>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NOTES_FILENAME, StoreError};
    use std::fs;
    use tempfile::TempDir;

    fn store() -> (TempDir, NoteStore) {
        let dir = TempDir::new().unwrap();
        let store = NoteStore::new(dir.path().join(NOTES_FILENAME));
        (dir, store)
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let note = Note::new(1, "abc", "n1");
        store.save("/a.pdf", std::slice::from_ref(&note)).unwrap();

        let loaded = store.load("/a.pdf").unwrap();
        assert_eq!(loaded, vec![note]);
        assert!(store.load("/b.pdf").unwrap().is_empty());
    }

    #[test]
    fn documents_do_not_share_notes() {
        let (_dir, store) = store();
        store.add("/a.pdf", Note::new(1, "x", "one")).unwrap();
        store.add("/b.txt", Note::new(2, "y", "two")).unwrap();
        let updated = store.add("/a.pdf", Note::new(3, "z", "three")).unwrap();

        assert_eq!(updated.len(), 2);
        assert_eq!(store.load("/b.txt").unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_only_that_note() {
        let (_dir, store) = store();
        store.add("/a.pdf", Note::new(1, "x", "one")).unwrap();
        store.add("/a.pdf", Note::new(2, "y", "two")).unwrap();

        let left = store.delete("/a.pdf", 1).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, 2);

        assert!(store.delete("/a.pdf", 2).unwrap().is_empty());
        let raw = fs::read_to_string(store.file_path()).unwrap();
        assert!(!raw.contains("/a.pdf"));
        assert!(store.delete("/missing.pdf", 9).unwrap().is_empty());
    }

    #[test]
    fn json_uses_original_field_names() {
        let (_dir, store) = store();
        store.add("/a.pdf", Note::new(7, "abc", "n1")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.file_path()).unwrap()).unwrap();
        let note = &raw["/a.pdf"][0];
        assert_eq!(note["id"], 7);
        assert_eq!(note["text"], "abc");
        assert_eq!(note["content"], "n1");
        assert!(note["timestamp"].is_string());
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let store = NoteStore::new(blocker.join(NOTES_FILENAME));
        let err = store.add("/a.pdf", Note::new(1, "x", "y")).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
