//! Region selection state for PDF pages

use serde::{Deserialize, Serialize};

/// Smallest width or height, in display pixels, of a usable region
pub const MIN_REGION_PX: f32 = 10.0;

/// A point on a page in display pixels (relative to the page's top-left corner)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SelectionPoint {
    /// Page number (1-indexed)
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned rectangle in display pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from two corners in any order
    #[must_use]
    pub fn from_corners(a: SelectionPoint, b: SelectionPoint) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Whether the rectangle is large enough to extract from
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width >= MIN_REGION_PX && self.height >= MIN_REGION_PX
    }

    /// Convert to document coordinates by undoing the zoom
    #[must_use]
    pub fn to_document(&self, zoom: f32) -> DocRect {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        DocRect {
            x: self.x / zoom,
            y: self.y / zoom,
            width: self.width / zoom,
            height: self.height / zoom,
        }
    }
}

/// Axis-aligned rectangle in document units, origin top-left
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DocRect {
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict overlap on both axes; rectangles that only touch do not overlap
    #[must_use]
    pub fn overlaps(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> bool {
        x0 < self.right() && x1 > self.x && y0 < self.bottom() && y1 > self.y
    }
}

/// Drag state while the user draws an extraction rectangle
#[derive(Clone, Debug, Default)]
pub struct RegionSelection {
    pub start: Option<SelectionPoint>,
    pub end: Option<SelectionPoint>,
    pub is_selecting: bool,
}

impl RegionSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_at(&mut self, point: SelectionPoint) {
        self.start = Some(point);
        self.end = Some(point);
        self.is_selecting = true;
    }

    /// Update the end point during the drag; points on other pages are ignored
    pub fn update_end(&mut self, point: SelectionPoint) {
        if self.is_selecting && self.start.is_some_and(|s| s.page == point.page) {
            self.end = Some(point);
        }
    }

    /// Finish the drag, returning the page and rectangle drawn
    pub fn finish(&mut self) -> Option<(usize, DisplayRect)> {
        self.is_selecting = false;
        let result = match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start.page, DisplayRect::from_corners(start, end))),
            _ => None,
        };
        self.clear();
        result
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.is_selecting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(page: usize, x: f32, y: f32) -> SelectionPoint {
        SelectionPoint { page, x, y }
    }

    #[test]
    fn drag_produces_normalized_rect() {
        let mut sel = RegionSelection::new();
        sel.start_at(pt(2, 100.0, 80.0));
        sel.update_end(pt(2, 40.0, 20.0));
        let (page, rect) = sel.finish().unwrap();
        assert_eq!(page, 2);
        assert_eq!(rect, DisplayRect::new(40.0, 20.0, 60.0, 60.0));
        assert!(!sel.is_selecting);
    }

    #[test]
    fn drag_ignores_points_on_other_pages() {
        let mut sel = RegionSelection::new();
        sel.start_at(pt(1, 0.0, 0.0));
        sel.update_end(pt(2, 50.0, 50.0));
        let (_, rect) = sel.finish().unwrap();
        assert_eq!(rect.width, 0.0);
    }

    #[test]
    fn small_rects_are_not_usable() {
        assert!(!DisplayRect::new(0.0, 0.0, 9.9, 100.0).is_usable());
        assert!(!DisplayRect::new(0.0, 0.0, 100.0, 9.0).is_usable());
        assert!(DisplayRect::new(0.0, 0.0, 10.0, 10.0).is_usable());
    }

    #[test]
    fn to_document_divides_by_zoom() {
        let doc = DisplayRect::new(150.0, 300.0, 75.0, 30.0).to_document(1.5);
        assert_eq!(doc.x, 100.0);
        assert_eq!(doc.y, 200.0);
        assert_eq!(doc.width, 50.0);
        assert_eq!(doc.height, 20.0);
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let rect = DocRect {
            x: 10.0,
            y: 10.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(rect.overlaps(15.0, 15.0, 25.0, 25.0));
        assert!(!rect.overlaps(20.0, 10.0, 30.0, 20.0));
        assert!(!rect.overlaps(10.0, 0.0, 20.0, 10.0));
        assert!(!rect.overlaps(30.0, 12.0, 40.0, 18.0));
    }
}
