//! Core types for PDF rendering

/// Page size in document units (points), as reported by the engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size of the page in display pixels at the given zoom
    #[must_use]
    pub fn scaled(self, zoom: f32) -> (u32, u32) {
        (
            (self.width * zoom).round().max(0.0) as u32,
            (self.height * zoom).round().max(0.0) as u32,
        )
    }
}

/// A single run of text on a page, as the engine's text layer reports it.
///
/// `transform` is the item's text matrix `[a, b, c, d, e, f]` in raw PDF
/// space (origin bottom-left). `width` is the advance width in document
/// units.
#[derive(Clone, Debug, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub transform: [f32; 6],
    pub width: f32,
    /// Whether this item is the last one on its line
    pub has_eol: bool,
}

impl TextItem {
    /// Glyph height approximated from the matrix's vertical scale component
    #[must_use]
    pub fn font_height(&self) -> f32 {
        let [_, _, c, d, _, _] = self.transform;
        c.hypot(d)
    }

    /// Bounding box in top-left document coordinates `(x0, y0, x1, y1)`
    #[must_use]
    pub fn bounds(&self, page_height: f32) -> (f32, f32, f32, f32) {
        let height = self.font_height();
        let x0 = self.transform[4];
        let baseline = page_height - self.transform[5];
        (x0, baseline - height, x0 + self.width.max(0.0), baseline)
    }
}

/// All text items of one page, in document order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayer {
    pub page_height: f32,
    pub items: Vec<TextItem>,
}

/// A text-layer item positioned for display at a particular zoom
#[derive(Clone, Debug, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub font_size: f32,
    pub width: f32,
}

impl TextLayer {
    /// Position every item for display, flipping to a top-left origin
    #[must_use]
    pub fn positioned(&self, zoom: f32) -> Vec<TextSpan> {
        self.items
            .iter()
            .map(|item| {
                let (x0, y0, _, _) = item.bounds(self.page_height);
                TextSpan {
                    text: item.text.clone(),
                    left: x0 * zoom,
                    top: y0 * zoom,
                    font_size: item.font_height() * zoom,
                    width: item.width * zoom,
                }
            })
            .collect()
    }
}

/// Rasterized page surface, PNG encoded
#[derive(Clone)]
pub struct PageRaster {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl std::fmt::Debug for PageRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRaster")
            .field("png_bytes", &self.png.len())
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .finish()
    }
}

/// Complete rendered page data
#[derive(Clone, Debug)]
pub struct PageData {
    /// Page number (1-indexed)
    pub page_num: usize,
    /// Zoom factor used for rendering
    pub zoom: f32,
    pub raster: PageRaster,
    /// Positioned text layer for selection
    pub spans: Vec<TextSpan>,
}
