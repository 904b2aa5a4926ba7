mod kind;
mod loader;

use std::path::{Path, PathBuf};

pub use kind::DocumentKind;
pub use loader::{LoadError, LoadedDocument, decode_text, load_document, load_path};

/// An opened document, keyed by its absolute path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub name: String,
}

impl DocumentRef {
    /// Absolutize a path (without touching the filesystem beyond cwd) and classify it
    #[must_use]
    pub fn resolve(path: &Path) -> Self {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            kind: DocumentKind::from_path(&path),
            name,
            path,
        }
    }

    /// String form of the path used as the key in every store
    #[must_use]
    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
