//! Lazy page scheduling
//!
//! Every page starts as a sized placeholder. The first few pages render
//! eagerly; the rest are scheduled the first time they come within the
//! lookahead margin of the viewport. The scheduler only decides *what* to
//! do and returns [`Effect`]s; the render service carries them out.

use super::types::PageSize;

/// Number of pages rendered right after opening
pub const DEFAULT_EAGER_PAGES: usize = 3;
/// Extra distance above and below the viewport that counts as visible
pub const DEFAULT_LOOKAHEAD_PX: u32 = 200;
/// Gap between consecutive pages in display pixels
pub const PAGE_SEPARATOR_PX: u32 = 10;

/// Render state of a single page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    Placeholder,
    Rendering,
    Rendered,
}

/// Commands that drive the scheduler
#[derive(Clone, Debug)]
pub enum Command {
    /// Document loaded: total page count and the first page's size
    Open { page_count: usize, first_page: PageSize },
    /// The visible window moved
    Viewport { scroll_top: u32, height: u32 },
    /// A page finished rendering
    Rendered(usize),
    /// A page failed to render
    RenderFailed(usize),
    /// Zoom level changed
    SetZoom(f32),
    /// Document closed
    Reset,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// (Re)create every page placeholder at the given display size
    CreatePlaceholders {
        count: usize,
        width_px: u32,
        height_px: u32,
    },
    /// Drop every rendered surface
    InvalidateAll,
    /// Render a page (1-indexed)
    RenderPage(usize),
    /// A page is done; the engine may release its per-page cache
    ReleasePage(usize),
}

/// Per-document lazy render scheduler
#[derive(Clone, Debug)]
pub struct PageScheduler {
    pages: Vec<PageState>,
    page_size: Option<PageSize>,
    zoom: f32,
    eager_pages: usize,
    lookahead_px: u32,
}

impl Default for PageScheduler {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_EAGER_PAGES, DEFAULT_LOOKAHEAD_PX)
    }
}

impl PageScheduler {
    #[must_use]
    pub fn new(zoom: f32, eager_pages: usize, lookahead_px: u32) -> Self {
        Self {
            pages: Vec::new(),
            page_size: None,
            zoom,
            eager_pages,
            lookahead_px,
        }
    }

    /// Whether placeholders exist (a document is open)
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.page_size.is_some()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// State of a page (1-indexed)
    #[must_use]
    pub fn page_state(&self, page: usize) -> Option<PageState> {
        page.checked_sub(1).and_then(|i| self.pages.get(i)).copied()
    }

    /// Pages currently in the given state
    #[must_use]
    pub fn pages_in(&self, state: PageState) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == state)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Placeholder height in display pixels
    #[must_use]
    pub fn page_height_px(&self) -> u32 {
        self.page_size.map(|s| s.scaled(self.zoom).1).unwrap_or(0)
    }

    /// Heights of every page in display pixels, for scroll math
    #[must_use]
    pub fn page_heights(&self) -> Vec<u32> {
        vec![self.page_height_px(); self.pages.len()]
    }

    /// Page whose area contains the given scroll offset (1-indexed)
    #[must_use]
    pub fn page_at_offset(&self, offset: u32) -> Option<usize> {
        if self.pages.is_empty() {
            return None;
        }
        let stride = self.page_height_px() + PAGE_SEPARATOR_PX;
        if stride == 0 {
            return Some(1);
        }
        let index = (offset / stride) as usize;
        Some(index.min(self.pages.len() - 1) + 1)
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Open {
                page_count,
                first_page,
            } => {
                self.page_size = Some(first_page);
                self.pages = vec![PageState::Placeholder; page_count];
                self.start()
            }

            Command::Viewport { scroll_top, height } => {
                if !self.is_loaded() {
                    return vec![];
                }
                let start = scroll_top.saturating_sub(self.lookahead_px);
                let end = scroll_top
                    .saturating_add(height)
                    .saturating_add(self.lookahead_px);
                let visible: Vec<usize> = (1..=self.pages.len())
                    .filter(|&page| {
                        let (top, bottom) = self.page_span(page);
                        top < end && bottom > start
                    })
                    .collect();
                visible
                    .into_iter()
                    .filter_map(|page| self.schedule(page))
                    .collect()
            }

            Command::Rendered(page) => match self.state_mut(page) {
                Some(state @ PageState::Rendering) => {
                    *state = PageState::Rendered;
                    vec![Effect::ReleasePage(page)]
                }
                _ => vec![],
            },

            Command::RenderFailed(page) => {
                if let Some(state @ PageState::Rendering) = self.state_mut(page) {
                    *state = PageState::Placeholder;
                }
                vec![]
            }

            Command::SetZoom(zoom) => {
                if (self.zoom - zoom).abs() <= f32::EPSILON {
                    return vec![];
                }
                self.zoom = zoom;
                if !self.is_loaded() {
                    return vec![];
                }
                self.pages.fill(PageState::Placeholder);
                let mut effects = vec![Effect::InvalidateAll];
                effects.extend(self.start());
                effects
            }

            Command::Reset => {
                self.pages.clear();
                self.page_size = None;
                vec![Effect::InvalidateAll]
            }
        }
    }

    fn start(&mut self) -> Vec<Effect> {
        let (width_px, height_px) = self
            .page_size
            .map(|s| s.scaled(self.zoom))
            .unwrap_or((0, 0));
        let mut effects = vec![Effect::CreatePlaceholders {
            count: self.pages.len(),
            width_px,
            height_px,
        }];
        let eager = self.eager_pages.min(self.pages.len());
        effects.extend((1..=eager).filter_map(|page| self.schedule(page)));
        effects
    }

    /// Move a placeholder to `Rendering`; pages already in flight or done are left alone
    fn schedule(&mut self, page: usize) -> Option<Effect> {
        let state = self.state_mut(page)?;
        if *state == PageState::Placeholder {
            *state = PageState::Rendering;
            Some(Effect::RenderPage(page))
        } else {
            None
        }
    }

    fn state_mut(&mut self, page: usize) -> Option<&mut PageState> {
        page.checked_sub(1).and_then(|i| self.pages.get_mut(i))
    }

    fn page_span(&self, page: usize) -> (u32, u32) {
        let height = self.page_height_px();
        let index = u32::try_from(page.saturating_sub(1)).unwrap_or(u32::MAX);
        let top = index.saturating_mul(height.saturating_add(PAGE_SEPARATOR_PX));
        (top, top.saturating_add(height))
    }
}
