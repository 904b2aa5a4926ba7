use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Document type, inferred from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "txt")]
    Text,
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "html")]
    Html,
}

impl DocumentKind {
    /// Classify a path by extension (case-insensitive); unknown types read as text
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("md" | "markdown") => Self::Markdown,
            Some("html" | "htm") => Self::Html,
            _ => Self::Text,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Html => "html",
        }
    }

    #[must_use]
    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("/a/b.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("notes.md")), DocumentKind::Markdown);
        assert_eq!(DocumentKind::from_path(Path::new("page.html")), DocumentKind::Html);
        assert_eq!(DocumentKind::from_path(Path::new("a.txt")), DocumentKind::Text);
        assert_eq!(DocumentKind::from_path(Path::new("README")), DocumentKind::Text);
    }
}
