//! PDF rendering infrastructure

mod cache;
mod engine;
#[cfg(feature = "mupdf")]
mod mupdf_engine;
mod poppler;
mod request;
mod scheduler;
mod selection;
mod service;
mod types;
mod view;
mod worker;
mod zoom;

use std::path::Path;
use std::sync::Arc;

pub use cache::{CacheKey, PageCache};
pub use engine::{EngineError, EngineFactory, PageEngine};
#[cfg(feature = "mupdf")]
pub use mupdf_engine::MuPdfEngine;
pub use poppler::{PopplerEngine, PopplerTools};
pub(crate) use poppler::{parse_page_count, run_tool};
pub use request::{RenderRequest, RenderResponse, RequestId};
pub use scheduler::{
    Command, DEFAULT_EAGER_PAGES, DEFAULT_LOOKAHEAD_PX, Effect, PAGE_SEPARATOR_PX, PageScheduler,
    PageState,
};
pub use selection::{DisplayRect, DocRect, MIN_REGION_PX, RegionSelection, SelectionPoint};
pub use service::{DEFAULT_CACHE_SIZE, RenderService};
pub use types::*;
pub use view::{PdfView, Placeholders, ViewOptions};
pub use zoom::Zoom;

/// Engine factory for the poppler command-line tools
#[must_use]
pub fn poppler_factory(tools: PopplerTools) -> EngineFactory {
    Arc::new(
        move |path: &Path| -> Result<Box<dyn PageEngine>, EngineError> {
            Ok(Box::new(PopplerEngine::new(path, tools.clone())))
        },
    )
}

/// Engine factory for in-process MuPDF rendering
#[cfg(feature = "mupdf")]
#[must_use]
pub fn mupdf_factory() -> EngineFactory {
    Arc::new(|path: &Path| -> Result<Box<dyn PageEngine>, EngineError> {
        Ok(Box::new(MuPdfEngine::open(path)?))
    })
}
