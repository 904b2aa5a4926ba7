//! Everything that belongs to the currently open document

use log::{debug, info};

use crate::document::DocumentRef;
use crate::extraction::{ExtractionLog, ExtractionPipeline};
use crate::pdf::{PdfView, RegionSelection};
use crate::render::RenderedDocument;
use crate::speech::Playback;
use crate::store::{Bookmark, Note};

/// A decoded text document and where the reader is in it
pub struct TextView {
    pub content: String,
    pub rendered: RenderedDocument,
    pub scroll_offset: u32,
}

/// A PDF: the lazily rendered view and its extraction chain
pub struct PdfDocument {
    pub view: PdfView,
    pub pipeline: ExtractionPipeline,
}

pub enum DocumentView {
    Text(TextView),
    Pdf(PdfDocument),
}

pub struct OpenDocument {
    pub doc: DocumentRef,
    pub view: DocumentView,
}

impl OpenDocument {
    pub fn as_pdf(&self) -> Option<&PdfDocument> {
        match &self.view {
            DocumentView::Pdf(pdf) => Some(pdf),
            DocumentView::Text(_) => None,
        }
    }

    pub fn as_pdf_mut(&mut self) -> Option<&mut PdfDocument> {
        match &mut self.view {
            DocumentView::Pdf(pdf) => Some(pdf),
            DocumentView::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextView> {
        match &self.view {
            DocumentView::Text(text) => Some(text),
            DocumentView::Pdf(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextView> {
        match &mut self.view {
            DocumentView::Text(text) => Some(text),
            DocumentView::Pdf(_) => None,
        }
    }
}

/// Session context: the single active document plus all state tied to it.
///
/// Switching documents replaces all of it in one step, so nothing from the
/// previous document (speech, render responses, extraction markers) can
/// leak into the next one.
pub struct Session {
    current: Option<OpenDocument>,
    notes: Vec<Note>,
    bookmarks: Vec<Bookmark>,
    extractions: ExtractionLog,
    selection: RegionSelection,
    extract_mode: bool,
    playback: Playback,
}

impl Session {
    pub fn new(playback: Playback) -> Self {
        Self {
            current: None,
            notes: Vec::new(),
            bookmarks: Vec::new(),
            extractions: ExtractionLog::new(),
            selection: RegionSelection::new(),
            extract_mode: false,
            playback,
        }
    }

    /// Tear down the current document and make `next` current
    pub fn switch_document(&mut self, next: OpenDocument, notes: Vec<Note>, bookmarks: Vec<Bookmark>) {
        self.reset();
        info!(
            "Session now on {:?} ({} notes, {} bookmarks)",
            next.doc.path,
            notes.len(),
            bookmarks.len()
        );
        self.current = Some(next);
        self.notes = notes;
        self.bookmarks = bookmarks;
    }

    /// Close the current document, if any
    pub fn close(&mut self) {
        if self.current.is_some() {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.playback.stop();
        if let Some(mut old) = self.current.take() {
            debug!("Closing {:?}", old.doc.path);
            if let Some(pdf) = old.as_pdf_mut() {
                pdf.view.close();
            }
        }
        self.notes.clear();
        self.bookmarks.clear();
        self.extractions.clear();
        self.selection.clear();
        self.extract_mode = false;
    }

    pub fn current(&self) -> Option<&OpenDocument> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut OpenDocument> {
        self.current.as_mut()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut Vec<Note> {
        &mut self.notes
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut Vec<Bookmark> {
        &mut self.bookmarks
    }

    pub fn extractions(&self) -> &ExtractionLog {
        &self.extractions
    }

    pub fn selection_mut(&mut self) -> &mut RegionSelection {
        &mut self.selection
    }

    pub fn extract_mode(&self) -> bool {
        self.extract_mode
    }

    pub fn set_extract_mode(&mut self, on: bool) {
        self.extract_mode = on;
        if !on {
            self.selection.clear();
        }
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    /// Split borrow for running an extraction: the PDF plus the log it writes to
    pub fn pdf_and_log(&mut self) -> Option<(&mut PdfDocument, &mut ExtractionLog)> {
        let pdf = self.current.as_mut()?.as_pdf_mut()?;
        Some((pdf, &mut self.extractions))
    }

    pub fn extractions_mut(&mut self) -> &mut ExtractionLog {
        &mut self.extractions
    }
}
