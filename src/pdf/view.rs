//! A continuously scrolled PDF: scheduler, zoom and render service wired together

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::engine::{EngineError, EngineFactory};
use super::request::RenderResponse;
use super::scheduler::{Command, Effect, PAGE_SEPARATOR_PX, PageScheduler, PageState};
use super::service::{DEFAULT_CACHE_SIZE, RenderService};
use super::types::{PageData, PageSize};
use super::zoom::Zoom;

/// Viewer options taken from settings
#[derive(Clone, Copy, Debug)]
pub struct ViewOptions {
    pub zoom: f32,
    pub eager_pages: usize,
    pub lookahead_px: u32,
    pub viewport_height: u32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            zoom: Zoom::DEFAULT_SCALE,
            eager_pages: super::scheduler::DEFAULT_EAGER_PAGES,
            lookahead_px: super::scheduler::DEFAULT_LOOKAHEAD_PX,
            viewport_height: 800,
        }
    }
}

/// Placeholder geometry for every page at the current zoom
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placeholders {
    pub count: usize,
    pub width_px: u32,
    pub height_px: u32,
}

pub struct PdfView {
    doc_path: PathBuf,
    factory: EngineFactory,
    first_page: PageSize,
    scheduler: PageScheduler,
    service: RenderService,
    zoom: Zoom,
    viewport_height: u32,
    placeholders: Placeholders,
    last_error: Option<String>,
}

impl PdfView {
    /// Open a document: size placeholders and start the eager renders
    pub fn open(
        doc_path: &Path,
        factory: EngineFactory,
        options: ViewOptions,
    ) -> Result<Self, EngineError> {
        let (page_count, first_page) = {
            let engine = factory(doc_path)?;
            let count = engine.page_count()?;
            if count == 0 {
                return Err(EngineError::Generic("document has no pages".to_string()));
            }
            (count, engine.page_size(1)?)
        };
        info!("Opened PDF {doc_path:?}: {page_count} pages, first page {first_page:?}");

        let zoom = Zoom::with_factor(options.zoom);
        let service = RenderService::new(doc_path, Arc::clone(&factory), DEFAULT_CACHE_SIZE);
        let mut view = Self {
            doc_path: doc_path.to_path_buf(),
            factory,
            first_page,
            scheduler: PageScheduler::new(zoom.factor(), options.eager_pages, options.lookahead_px),
            service,
            zoom,
            viewport_height: options.viewport_height,
            placeholders: Placeholders::default(),
            last_error: None,
        };
        let effects = view.scheduler.apply(Command::Open {
            page_count,
            first_page,
        });
        view.execute(effects);
        Ok(view)
    }

    #[must_use]
    pub fn doc_path(&self) -> &Path {
        &self.doc_path
    }

    #[must_use]
    pub fn factory(&self) -> &EngineFactory {
        &self.factory
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.scheduler.page_count()
    }

    #[must_use]
    pub fn first_page_size(&self) -> PageSize {
        self.first_page
    }

    #[must_use]
    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    #[must_use]
    pub fn placeholders(&self) -> Placeholders {
        self.placeholders
    }

    #[must_use]
    pub fn page_state(&self, page: usize) -> Option<PageState> {
        self.scheduler.page_state(page)
    }

    #[must_use]
    pub fn pages_in(&self, state: PageState) -> Vec<usize> {
        self.scheduler.pages_in(state)
    }

    /// Page at the top of the viewport (1-indexed)
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.scheduler
            .page_at_offset(self.zoom.scroll_offset)
            .unwrap_or(1)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn rendered_page(&self, page: usize) -> Option<Arc<PageData>> {
        self.service.cached_page(page, self.zoom.factor())
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.zoom.step_in();
        if changed {
            self.apply_zoom();
        }
        changed
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.zoom.step_out();
        if changed {
            self.apply_zoom();
        }
        changed
    }

    fn apply_zoom(&mut self) {
        let effects = self.scheduler.apply(Command::SetZoom(self.zoom.factor()));
        self.execute(effects);
        self.refresh_viewport();
    }

    /// Scroll by a pixel delta and schedule whatever came into view
    pub fn scroll_by(&mut self, delta: i64) {
        self.zoom.scroll_by(delta);
        self.refresh_viewport();
    }

    /// Jump so that the given page is at the top of the viewport
    pub fn go_to_page(&mut self, page: usize) {
        let page = page.clamp(1, self.page_count().max(1));
        self.zoom
            .scroll_to_page(page, &self.scheduler.page_heights(), PAGE_SEPARATOR_PX);
        self.refresh_viewport();
    }

    pub fn set_scroll_offset(&mut self, offset: u32) {
        self.zoom.scroll_offset = offset;
        self.refresh_viewport();
    }

    fn refresh_viewport(&mut self) {
        let effects = self.scheduler.apply(Command::Viewport {
            scroll_top: self.zoom.scroll_offset,
            height: self.viewport_height,
        });
        self.execute(effects);
    }

    /// Feed every available render response back into the scheduler
    pub fn pump(&mut self) {
        for response in self.service.poll_responses() {
            self.handle_response(response);
        }
    }

    /// Pump until nothing is in flight or the timeout elapses
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.service.has_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if let Some(response) = self.service.wait_response(remaining) {
                self.handle_response(response);
            }
        }
        true
    }

    fn handle_response(&mut self, response: RenderResponse) {
        match response {
            RenderResponse::Page { page, zoom, .. } => {
                if self.is_stale(zoom) {
                    debug!("Dropping stale render of page {page} at zoom {zoom}");
                    return;
                }
                let effects = self.scheduler.apply(Command::Rendered(page));
                self.execute(effects);
            }
            RenderResponse::Error {
                page, zoom, error, ..
            } => {
                if self.is_stale(zoom) {
                    return;
                }
                warn!("Rendering page {page} failed: {error}");
                self.last_error = Some(error.to_string());
                let effects = self.scheduler.apply(Command::RenderFailed(page));
                self.execute(effects);
            }
            RenderResponse::EngineUnavailable(message) => {
                self.last_error = Some(message);
                for page in self.scheduler.pages_in(PageState::Rendering) {
                    let _ = self.scheduler.apply(Command::RenderFailed(page));
                }
            }
        }
    }

    fn is_stale(&self, zoom: f32) -> bool {
        (zoom - self.zoom.factor()).abs() > f32::EPSILON
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CreatePlaceholders {
                    count,
                    width_px,
                    height_px,
                } => {
                    self.placeholders = Placeholders {
                        count,
                        width_px,
                        height_px,
                    };
                }
                Effect::InvalidateAll => self.service.invalidate_all(),
                Effect::RenderPage(page) => {
                    self.service.request_page(page, self.zoom.factor());
                }
                Effect::ReleasePage(page) => self.service.release_page(page),
            }
        }
    }

    /// Stop rendering; the view must not be used afterwards
    pub fn close(&mut self) {
        let _ = self.scheduler.apply(Command::Reset);
        self.service.shutdown();
    }
}
