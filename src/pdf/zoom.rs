//! Zoom and scroll state for PDF viewing

/// Zoom and vertical scroll state for continuous PDF viewing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    pub factor: f32,

    /// Vertical scroll offset in display pixels from the top of the document
    pub scroll_offset: u32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: Self::DEFAULT_SCALE,
            scroll_offset: 0,
        }
    }
}

impl Zoom {
    pub const DEFAULT_SCALE: f32 = 1.5;
    /// Additive step per zoom in/out
    pub const STEP: f32 = 0.25;
    pub const MIN_SCALE: f32 = 0.5;
    pub const MAX_SCALE: f32 = 3.0;

    #[must_use]
    pub fn with_factor(factor: f32) -> Self {
        Self {
            factor: Self::clamp_factor(factor),
            scroll_offset: 0,
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom in by one step; returns true if the factor changed
    pub fn step_in(&mut self) -> bool {
        self.set(self.factor + Self::STEP)
    }

    /// Zoom out by one step; returns true if the factor changed
    pub fn step_out(&mut self) -> bool {
        self.set(self.factor - Self::STEP)
    }

    fn set(&mut self, factor: f32) -> bool {
        let next = Self::clamp_factor(factor);
        if (next - self.factor).abs() > f32::EPSILON {
            // Keep the same relative position in the document
            let ratio = next / self.factor;
            self.scroll_offset = (self.scroll_offset as f32 * ratio) as u32;
            self.factor = next;
            true
        } else {
            false
        }
    }

    /// Percentage label, e.g. `150%`
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}%", (self.factor * 100.0).round() as u32)
    }

    /// Scroll to position the given page (1-indexed) at the top of the viewport
    pub fn scroll_to_page(&mut self, page: usize, page_heights: &[u32], separator_height: u32) {
        let offset: u32 = page_heights
            .iter()
            .take(page.saturating_sub(1))
            .map(|&h| h + separator_height)
            .sum();
        self.scroll_offset = offset;
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let next = i64::from(self.scroll_offset).saturating_add(delta).max(0);
        self.scroll_offset = u32::try_from(next).unwrap_or(u32::MAX);
    }

    /// Clamp factor to valid range, handling NaN/Inf
    pub fn clamp_factor(factor: f32) -> f32 {
        if !factor.is_finite() {
            Self::DEFAULT_SCALE
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }
}
