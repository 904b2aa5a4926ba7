//! User-facing actions over the session and the stores

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};

use crate::document::{DocumentRef, LoadError, LoadedDocument, load_document};
use crate::extraction::{
    ExtractError, ExtractionOutcome, ExtractionPipeline, ExtractionRecord, PdftotextExtractor,
    RegionExtractor, TextLayerExtractor, TextRefiner,
};
use crate::highlight::highlight_excerpts;
use crate::pdf::{DisplayRect, EngineError, EngineFactory, PdfView, SelectionPoint};
use crate::render::{RenderOptions, render_text};
use crate::services::{ChatReformatter, ServiceError, Translation, Translator};
use crate::session::{DocumentView, OpenDocument, PdfDocument, Session, TextView};
use crate::settings::Settings;
use crate::speech::{CommandSpeaker, Playback, PlaybackState, Speaker, SpeechError};
use crate::store::{
    Bookmark, HistoryEntry, Note, Position, StoreError, Stores, next_id,
};

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// Rejected before any I/O
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn invalid(message: &str) -> ReaderError {
    debug!("Rejected: {message}");
    ReaderError::Invalid(message.to_string())
}

/// Where to go for a bookmark or a restored history position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    Page { page: usize, scroll_offset: u32 },
    Scroll {
        scroll_offset: u32,
        search_text: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(Translation),
    /// No key configured; carries setup instructions
    NotConfigured(String),
    /// Request failed; the original text stays as it was
    Failed(String),
}

pub struct Reader {
    settings: Settings,
    stores: Stores,
    factory: EngineFactory,
    translator: Translator,
    session: Session,
}

/// Engine used when nothing else is configured
pub fn default_engine_factory(settings: &Settings) -> EngineFactory {
    #[cfg(feature = "mupdf")]
    {
        let _ = settings;
        crate::pdf::mupdf_factory()
    }
    #[cfg(not(feature = "mupdf"))]
    {
        crate::pdf::poppler_factory(settings.extractor.tools())
    }
}

impl Reader {
    pub fn new(
        settings: Settings,
        stores: Stores,
        factory: EngineFactory,
        speaker: Box<dyn Speaker>,
    ) -> Self {
        Self {
            translator: Translator::new(settings.translation.clone()),
            session: Session::new(Playback::new(speaker)),
            settings,
            stores,
            factory,
        }
    }

    /// Reader with the default engine and the configured speech command
    pub fn with_defaults(settings: Settings, data_dir: &Path) -> Self {
        let factory = default_engine_factory(&settings);
        let speaker = Box::new(CommandSpeaker::from_settings(&settings.speech));
        Self::new(settings, Stores::in_dir(data_dir), factory, speaker)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current(&self) -> Option<&OpenDocument> {
        self.session.current()
    }

    fn require_document(&self) -> Result<&OpenDocument, ReaderError> {
        self.session
            .current()
            .ok_or_else(|| invalid("No document is open"))
    }

    fn require_key(&self) -> Result<String, ReaderError> {
        Ok(self.require_document()?.doc.key())
    }

    // ---- opening and closing ----

    /// Open a document, replacing the current one.
    ///
    /// Nothing changes if the file cannot be read or the PDF engine fails.
    pub fn open(&mut self, path: &Path) -> Result<&OpenDocument, ReaderError> {
        let doc = DocumentRef::resolve(path);
        let loaded = load_document(&doc)?;
        let view = match loaded {
            LoadedDocument::Text { content, kind } => {
                let options = RenderOptions {
                    line_numbers: self.settings.viewer.line_numbers,
                };
                DocumentView::Text(TextView {
                    rendered: render_text(&content, kind, options),
                    content,
                    scroll_offset: 0,
                })
            }
            LoadedDocument::Pdf { bytes } => {
                debug!("PDF {:?} is {} bytes", doc.path, bytes.len());
                DocumentView::Pdf(self.open_pdf(&doc.path)?)
            }
        };

        let key = doc.key();
        let notes = self.stores.notes.load(&key)?;
        let bookmarks = self.stores.bookmarks.load(&key)?;
        let entry = HistoryEntry::for_document(&doc);

        self.save_position();
        self.session
            .switch_document(OpenDocument { doc, view }, notes, bookmarks);

        let restored = match self.stores.history.record_open(entry) {
            Ok(entries) => entries.first().and_then(|e| e.last_position),
            Err(e) => {
                warn!("Could not update history: {e}");
                None
            }
        };
        if let Some(position) = restored {
            info!("Restoring position {position:?}");
            self.restore_position(position);
        }
        self.require_document()
    }

    fn open_pdf(&self, path: &Path) -> Result<PdfDocument, ReaderError> {
        let view = PdfView::open(
            path,
            Arc::clone(&self.factory),
            self.settings.viewer.view_options(),
        )?;

        let mut strategies: Vec<Box<dyn RegionExtractor>> = vec![Box::new(
            PdftotextExtractor::new(self.settings.extractor.pdftotext.clone(), path),
        )];
        match (self.factory)(path) {
            Ok(engine) => strategies.push(Box::new(TextLayerExtractor::new(engine))),
            Err(e) => warn!("Text layer fallback unavailable: {e}"),
        }
        let mut pipeline = ExtractionPipeline::new(strategies);
        match ChatReformatter::from_settings(&self.settings.reformat) {
            Ok(Some(reformatter)) => {
                pipeline = pipeline.with_refiner(Box::new(reformatter) as Box<dyn TextRefiner>);
            }
            Ok(None) => {}
            Err(e) => warn!("Reformatting disabled: {e}"),
        }
        Ok(PdfDocument { view, pipeline })
    }

    /// Reading position in the current document
    pub fn position(&self) -> Option<Position> {
        let open = self.session.current()?;
        Some(match &open.view {
            DocumentView::Pdf(pdf) => Position {
                page: Some(pdf.view.current_page()),
                scroll_offset: pdf.view.zoom().scroll_offset,
            },
            DocumentView::Text(text) => Position {
                page: None,
                scroll_offset: text.scroll_offset,
            },
        })
    }

    /// Store the current position in the history; failures are only logged
    pub fn save_position(&self) {
        let (Some(open), Some(position)) = (self.session.current(), self.position()) else {
            return;
        };
        if let Err(e) = self
            .stores
            .history
            .update_position(&open.doc.key(), position)
        {
            warn!("Could not save reading position: {e}");
        }
    }

    fn restore_position(&mut self, position: Position) {
        let Some(open) = self.session.current_mut() else {
            return;
        };
        match &mut open.view {
            DocumentView::Pdf(pdf) => pdf.view.set_scroll_offset(position.scroll_offset),
            DocumentView::Text(text) => text.scroll_offset = position.scroll_offset,
        }
    }

    pub fn close(&mut self) {
        self.save_position();
        self.session.close();
    }

    /// Rendered HTML of a text document with note excerpts highlighted
    pub fn rendered_html(&self) -> Option<String> {
        let text = self.session.current()?.as_text()?;
        Some(highlight_excerpts(
            &text.rendered.html,
            self.session.notes().iter().map(|n| n.text.as_str()),
        ))
    }

    // ---- notes ----

    pub fn notes(&self) -> &[Note] {
        self.session.notes()
    }

    /// Add a note; it is dropped from memory again if saving fails
    pub fn add_note(&mut self, excerpt: &str, content: &str) -> Result<Note, ReaderError> {
        let key = self.require_key()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(invalid("Note content is empty"));
        }

        let note = Note::new(next_id(self.session.notes()), excerpt.trim(), content);
        self.session.notes_mut().push(note.clone());
        match self.stores.notes.add(&key, note.clone()) {
            Ok(_) => {
                info!("Added note {} to {key}", note.id);
                Ok(note)
            }
            Err(e) => {
                self.session.notes_mut().retain(|n| n.id != note.id);
                Err(e.into())
            }
        }
    }

    pub fn delete_note(&mut self, id: u64) -> Result<(), ReaderError> {
        let key = self.require_key()?;
        if !self.session.notes().iter().any(|n| n.id == id) {
            return Err(invalid(&format!("No note with id {id}")));
        }
        let remaining = self.stores.notes.delete(&key, id)?;
        *self.session.notes_mut() = remaining;
        Ok(())
    }

    // ---- bookmarks ----

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.session.bookmarks()
    }

    /// Bookmark the current position, labelled with the selection if there is one
    pub fn add_bookmark(&mut self, selection: Option<&str>) -> Result<Bookmark, ReaderError> {
        let key = self.require_key()?;
        let position = self.position().unwrap_or(Position {
            page: None,
            scroll_offset: 0,
        });
        let selection = selection.map(str::trim).filter(|s| !s.is_empty());
        let is_pdf = self.require_document()?.doc.kind.is_pdf();

        let bookmark = Bookmark {
            id: next_id(self.session.bookmarks()),
            text: selection
                .map(str::to_string)
                .unwrap_or_else(|| Bookmark::placeholder_label(self.session.bookmarks().len())),
            page: if is_pdf { position.page } else { None },
            search_text: if is_pdf {
                None
            } else {
                selection.map(|s| s.chars().take(50).collect())
            },
            scroll_position: position.scroll_offset,
            timestamp: Utc::now(),
        };

        self.session.bookmarks_mut().push(bookmark.clone());
        match self.stores.bookmarks.add(&key, bookmark.clone()) {
            Ok(_) => Ok(bookmark),
            Err(e) => {
                self.session.bookmarks_mut().retain(|b| b.id != bookmark.id);
                Err(e.into())
            }
        }
    }

    pub fn delete_bookmark(&mut self, id: u64) -> Result<(), ReaderError> {
        let key = self.require_key()?;
        if !self.session.bookmarks().iter().any(|b| b.id == id) {
            return Err(invalid(&format!("No bookmark with id {id}")));
        }
        let remaining = self.stores.bookmarks.delete(&key, id)?;
        *self.session.bookmarks_mut() = remaining;
        Ok(())
    }

    /// Jump to a bookmark and report where it went
    pub fn goto_bookmark(&mut self, id: u64) -> Result<NavigationTarget, ReaderError> {
        let bookmark = self
            .session
            .bookmarks()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| invalid(&format!("No bookmark with id {id}")))?;
        let target = bookmark_target(&bookmark);
        self.navigate(&target)?;
        Ok(target)
    }

    fn navigate(&mut self, target: &NavigationTarget) -> Result<(), ReaderError> {
        let open = self
            .session
            .current_mut()
            .ok_or_else(|| invalid("No document is open"))?;
        match (&mut open.view, target) {
            (DocumentView::Pdf(pdf), NavigationTarget::Page { page, .. }) => {
                pdf.view.go_to_page(*page);
            }
            (DocumentView::Pdf(pdf), NavigationTarget::Scroll { scroll_offset, .. }) => {
                pdf.view.set_scroll_offset(*scroll_offset);
            }
            (DocumentView::Text(text), NavigationTarget::Scroll { scroll_offset, .. })
            | (DocumentView::Text(text), NavigationTarget::Page { scroll_offset, .. }) => {
                text.scroll_offset = *scroll_offset;
            }
        }
        Ok(())
    }

    // ---- history ----

    pub fn history(&self) -> Result<Vec<HistoryEntry>, ReaderError> {
        Ok(self.stores.history.list()?)
    }

    pub fn remove_history(&self, file_path: &str) -> Result<(), ReaderError> {
        self.stores.history.remove(file_path)?;
        Ok(())
    }

    pub fn clear_history(&self) -> Result<(), ReaderError> {
        self.stores.history.clear()?;
        Ok(())
    }

    /// Reopen the n-th history entry (0 = most recent), restoring its position
    pub fn open_history(&mut self, index: usize) -> Result<&OpenDocument, ReaderError> {
        let entries = self.stores.history.list()?;
        let entry = entries
            .get(index)
            .ok_or_else(|| invalid(&format!("No history entry #{}", index + 1)))?;
        let path = PathBuf::from(&entry.file_path);
        self.open(&path)
    }

    // ---- translation ----

    pub fn translate(&mut self, text: &str) -> Result<TranslationOutcome, ReaderError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(invalid("Nothing selected to translate"));
        }
        Ok(match self.translator.translate(text) {
            Ok(translation) => TranslationOutcome::Translated(translation),
            Err(ServiceError::NotConfigured(message)) => TranslationOutcome::NotConfigured(message),
            Err(e) => {
                warn!("Translation failed: {e}");
                TranslationOutcome::Failed(e.to_string())
            }
        })
    }

    // ---- speech ----

    /// Read `text` aloud, or the document's own text when none is given
    pub fn speak(&mut self, text: Option<&str>) -> Result<(), ReaderError> {
        let text = match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => text.to_string(),
            None => self.default_speech_text()?,
        };
        self.session.playback_mut().speak(&text)?;
        Ok(())
    }

    fn default_speech_text(&self) -> Result<String, ReaderError> {
        let open = self.require_document()?;
        match &open.view {
            DocumentView::Text(text) => Ok(text.content.clone()),
            DocumentView::Pdf(_) => self
                .session
                .extractions()
                .records()
                .first()
                .map(|r| r.text.clone())
                .ok_or_else(|| invalid("Nothing to read: extract a region first")),
        }
    }

    pub fn pause_speech(&mut self) -> Result<bool, ReaderError> {
        Ok(self.session.playback_mut().pause()?)
    }

    pub fn resume_speech(&mut self) -> Result<bool, ReaderError> {
        Ok(self.session.playback_mut().resume()?)
    }

    pub fn stop_speech(&mut self) {
        self.session.playback_mut().stop();
    }

    pub fn speech_state(&mut self) -> PlaybackState {
        self.session.playback_mut().state()
    }

    // ---- region extraction ----

    pub fn set_extract_mode(&mut self, on: bool) -> Result<(), ReaderError> {
        let open = self.require_document()?;
        if on && !open.doc.kind.is_pdf() {
            return Err(invalid("Region extraction works on PDF documents only"));
        }
        self.session.set_extract_mode(on);
        Ok(())
    }

    pub fn begin_region(&mut self, point: SelectionPoint) -> Result<(), ReaderError> {
        self.require_extract_mode()?;
        self.session.selection_mut().start_at(point);
        Ok(())
    }

    pub fn drag_region(&mut self, point: SelectionPoint) {
        self.session.selection_mut().update_end(point);
    }

    /// Finish the drag and extract whatever was drawn
    pub fn finish_region(&mut self) -> Result<ExtractionOutcome, ReaderError> {
        self.require_extract_mode()?;
        let Some((page, rect)) = self.session.selection_mut().finish() else {
            return Err(invalid("No region selected"));
        };
        self.extract_region(page, rect)
    }

    fn require_extract_mode(&self) -> Result<(), ReaderError> {
        if !self.session.extract_mode() {
            return Err(invalid("Extraction mode is off"));
        }
        Ok(())
    }

    /// Extract a rectangle given in display pixels at the current zoom
    pub fn extract_region(
        &mut self,
        page: usize,
        rect: DisplayRect,
    ) -> Result<ExtractionOutcome, ReaderError> {
        self.require_extract_mode()?;
        let (pdf, log) = self
            .session
            .pdf_and_log()
            .ok_or_else(|| invalid("Region extraction works on PDF documents only"))?;
        if page == 0 || page > pdf.view.page_count() {
            return Err(invalid(&format!("No page {page} in this document")));
        }
        let zoom = pdf.view.zoom().factor();
        Ok(pdf.pipeline.run(log, page, rect, zoom)?)
    }

    pub fn extractions(&self) -> &[ExtractionRecord] {
        self.session.extractions().records()
    }

    pub fn delete_extraction(&mut self, id: u64) -> Result<(), ReaderError> {
        self.session
            .extractions_mut()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| invalid(&format!("No extraction with id {id}")))
    }

    /// Text of one record, or of all records when `id` is `None`
    pub fn extraction_text(&self, id: Option<u64>) -> Result<String, ReaderError> {
        let log = self.session.extractions();
        match id {
            Some(id) => log
                .get(id)
                .map(|r| r.text.clone())
                .ok_or_else(|| invalid(&format!("No extraction with id {id}"))),
            None if log.is_empty() => Err(invalid("No extractions yet")),
            None => Ok(log.joined_text()),
        }
    }

    pub fn copy_extractions(&self, id: Option<u64>) -> Result<String, ReaderError> {
        let text = self.extraction_text(id)?;
        copy_to_clipboard(&text)?;
        Ok(text)
    }

    // ---- viewer ----

    fn pdf_view_mut(&mut self) -> Result<&mut PdfView, ReaderError> {
        self.session
            .current_mut()
            .and_then(OpenDocument::as_pdf_mut)
            .map(|pdf| &mut pdf.view)
            .ok_or_else(|| invalid("Zoom applies to PDF documents only"))
    }

    /// Returns the new zoom factor
    pub fn zoom_in(&mut self) -> Result<f32, ReaderError> {
        let view = self.pdf_view_mut()?;
        view.zoom_in();
        Ok(view.zoom().factor())
    }

    pub fn zoom_out(&mut self) -> Result<f32, ReaderError> {
        let view = self.pdf_view_mut()?;
        view.zoom_out();
        Ok(view.zoom().factor())
    }

    pub fn scroll(&mut self, delta: i64) -> Result<u32, ReaderError> {
        let open = self
            .session
            .current_mut()
            .ok_or_else(|| invalid("No document is open"))?;
        Ok(match &mut open.view {
            DocumentView::Pdf(pdf) => {
                pdf.view.scroll_by(delta);
                pdf.view.zoom().scroll_offset
            }
            DocumentView::Text(text) => {
                let offset = i64::from(text.scroll_offset).saturating_add(delta).max(0);
                text.scroll_offset = u32::try_from(offset).unwrap_or(u32::MAX);
                text.scroll_offset
            }
        })
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<(), ReaderError> {
        let view = self.pdf_view_mut()?;
        view.go_to_page(page);
        Ok(())
    }

    /// Drain render responses; true if nothing is left in flight
    pub fn wait_for_pages(&mut self, timeout: Duration) -> bool {
        match self.session.current_mut().and_then(OpenDocument::as_pdf_mut) {
            Some(pdf) => pdf.view.wait_idle(timeout),
            None => true,
        }
    }

    /// Write every page of the current PDF as `page-NNN.png` into `dir`
    pub fn export_pages(&self, dir: &Path) -> Result<Vec<PathBuf>, ReaderError> {
        let open = self.require_document()?;
        let pdf = open
            .as_pdf()
            .ok_or_else(|| invalid("Only PDF pages can be exported"))?;
        let zoom = pdf.view.zoom().factor();
        let engine = (self.factory)(&open.doc.path)?;
        fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(pdf.view.page_count());
        for page in 1..=pdf.view.page_count() {
            let data = engine.render_page(page, zoom)?;
            let path = dir.join(format!("page-{page:03}.png"));
            fs::write(&path, &data.raster.png)?;
            written.push(path);
        }
        info!("Exported {} pages to {dir:?}", written.len());
        Ok(written)
    }
}

/// PDF bookmarks go to their page; others to their scroll offset
pub fn bookmark_target(bookmark: &Bookmark) -> NavigationTarget {
    match bookmark.page {
        Some(page) => NavigationTarget::Page {
            page,
            scroll_offset: bookmark.scroll_position,
        },
        None => NavigationTarget::Scroll {
            scroll_offset: bookmark.scroll_position,
            search_text: bookmark.search_text.clone(),
        },
    }
}

fn copy_to_clipboard(text: &str) -> Result<(), ReaderError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| ReaderError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| ReaderError::Clipboard(e.to_string()))?;
    debug!("Copied {} chars to clipboard", text.chars().count());
    Ok(())
}
