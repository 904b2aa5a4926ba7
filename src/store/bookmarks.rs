use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentStore, Entry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: u64,
    /// Selected text, or a numbered placeholder
    pub text: String,
    /// Page of a PDF bookmark (1-indexed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Snippet used to find the spot again in a text document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(default)]
    pub scroll_position: u32,
    pub timestamp: DateTime<Utc>,
}

impl Bookmark {
    /// Label used when nothing was selected
    pub fn placeholder_label(existing: usize) -> String {
        format!("Bookmark {}", existing + 1)
    }
}

impl Entry for Bookmark {
    fn id(&self) -> u64 {
        self.id
    }
}

pub type BookmarkStore = DocumentStore<Bookmark>;
