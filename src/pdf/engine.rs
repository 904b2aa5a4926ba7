//! The seam between the reader and whatever actually rasterizes PDFs

use std::path::Path;
use std::sync::Arc;

use super::types::{PageData, PageSize, TextLayer};

/// Errors from a page engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("malformed engine output: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Generic(String),
}

/// Rendering/text-layer engine for one open document.
///
/// Pages are 1-indexed. Implementations need not be thread-safe; the render
/// service opens its own instance inside the worker thread.
pub trait PageEngine {
    fn page_count(&self) -> Result<usize, EngineError>;

    /// Native size of a page in document units
    fn page_size(&self, page: usize) -> Result<PageSize, EngineError>;

    /// Text items of a page, in document order
    fn text_layer(&self, page: usize) -> Result<TextLayer, EngineError>;

    /// Rasterize a page and position its text layer at the given zoom
    fn render_page(&self, page: usize, zoom: f32) -> Result<PageData, EngineError>;

    /// Drop any per-page state kept after rendering
    fn release_page(&self, _page: usize) {}
}

/// Opens an engine for a document path
pub type EngineFactory =
    Arc<dyn Fn(&Path) -> Result<Box<dyn PageEngine>, EngineError> + Send + Sync>;
