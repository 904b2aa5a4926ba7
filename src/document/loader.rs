//! Reading documents from disk and repairing their text encoding

use std::fs;
use std::path::Path;

use encoding_rs::{GBK, UTF_16LE};
use log::{debug, info};

use super::{DocumentKind, DocumentRef};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Contents of an opened document
#[derive(Clone, Debug)]
pub enum LoadedDocument {
    /// Decoded text of a txt/md/html file
    Text { content: String, kind: DocumentKind },
    /// Raw bytes of a PDF, handed to the page engine
    Pdf { bytes: Vec<u8> },
}

impl LoadedDocument {
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Text { kind, .. } => *kind,
            Self::Pdf { .. } => DocumentKind::Pdf,
        }
    }
}

/// Read a document; text files are decoded, PDFs are returned as bytes
pub fn load_document(doc: &DocumentRef) -> Result<LoadedDocument, LoadError> {
    let bytes = fs::read(&doc.path).map_err(|source| LoadError::Read {
        path: doc.path.display().to_string(),
        source,
    })?;
    info!("Read {} bytes from {:?}", bytes.len(), doc.path);

    if doc.kind.is_pdf() {
        return Ok(LoadedDocument::Pdf { bytes });
    }

    Ok(LoadedDocument::Text {
        content: decode_text(&bytes),
        kind: doc.kind,
    })
}

/// Convenience for paths that have not been resolved to a [`DocumentRef`] yet
pub fn load_path(path: &Path) -> Result<LoadedDocument, LoadError> {
    load_document(&DocumentRef::resolve(path))
}

/// Decode text bytes: BOM sniffing first, then UTF-8 with a GBK fallback.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return String::from_utf8_lossy(rest).into_owned();
    }

    if let Some(rest) = bytes.strip_prefix(UTF16LE_BOM) {
        let (text, _) = UTF_16LE.decode_without_bom_handling(rest);
        return text.into_owned();
    }

    let utf8 = String::from_utf8_lossy(bytes);
    if !looks_garbled(&utf8) {
        return utf8.into_owned();
    }

    let (legacy, had_errors) = GBK.decode_without_bom_handling(bytes);
    if had_errors {
        debug!("GBK fallback also failed, keeping UTF-8 decoding");
        utf8.into_owned()
    } else {
        debug!("Text re-decoded as GBK");
        legacy.into_owned()
    }
}

/// Replacement characters or control bytes other than tab/LF/CR
fn looks_garbled(text: &str) -> bool {
    text.chars().any(|c| {
        c == char::REPLACEMENT_CHARACTER
            || matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
    })
}
