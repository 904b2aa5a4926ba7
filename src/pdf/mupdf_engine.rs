//! In-process page engine backed by MuPDF

use std::fmt::Display;
use std::path::Path;

use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, Pixmap, TextPageFlags};

use super::engine::{EngineError, PageEngine};
use super::types::{PageData, PageRaster, PageSize, TextItem, TextLayer};

pub struct MuPdfEngine {
    doc: Document,
}

impl MuPdfEngine {
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let doc = Document::open(path.to_string_lossy().as_ref()).map_err(fault)?;
        Ok(Self { doc })
    }

    fn load(&self, page: usize) -> Result<mupdf::Page, EngineError> {
        let count = self.page_count()?;
        if page == 0 || page > count {
            return Err(EngineError::PageOutOfRange { page, count });
        }
        self.doc.load_page(page as i32 - 1).map_err(fault)
    }
}

fn fault(e: impl Display) -> EngineError {
    EngineError::Generic(e.to_string())
}

impl PageEngine for MuPdfEngine {
    fn page_count(&self) -> Result<usize, EngineError> {
        Ok(self.doc.page_count().map_err(fault)? as usize)
    }

    fn page_size(&self, page: usize) -> Result<PageSize, EngineError> {
        let bounds = self.load(page)?.bounds().map_err(fault)?;
        Ok(PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
    }

    fn text_layer(&self, page: usize) -> Result<TextLayer, EngineError> {
        let page = self.load(page)?;
        let bounds = page.bounds().map_err(fault)?;
        let page_height = bounds.y1 - bounds.y0;
        let text_page = page.to_text_page(TextPageFlags::empty()).map_err(fault)?;

        let mut items = Vec::new();
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let text: String = line.chars().filter_map(|ch| ch.char()).collect();
                if text.trim().is_empty() {
                    continue;
                }
                let bbox = line.bounds();
                let height = bbox.y1 - bbox.y0;
                items.push(TextItem {
                    text,
                    transform: [height, 0.0, 0.0, height, bbox.x0, page_height - bbox.y1],
                    width: bbox.x1 - bbox.x0,
                    has_eol: true,
                });
            }
        }
        Ok(TextLayer { page_height, items })
    }

    fn render_page(&self, page_num: usize, zoom: f32) -> Result<PageData, EngineError> {
        let page = self.load(page_num)?;
        let rgb = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&Matrix::new_scale(zoom, zoom), &rgb, false, false)
            .map_err(fault)?;
        let pixels = pixmap_to_rgb(&pixmap)?;
        let png = encode_png(&pixels, pixmap.width(), pixmap.height())?;
        let spans = self.text_layer(page_num)?.positioned(zoom);

        Ok(PageData {
            page_num,
            zoom,
            raster: PageRaster {
                png,
                width_px: pixmap.width(),
                height_px: pixmap.height(),
            },
            spans,
        })
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, EngineError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(EngineError::Generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(EngineError::Generic("Pixmap buffer size mismatch".to_string()));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EngineError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().map_err(fault)?;
        writer.write_image_data(rgb).map_err(fault)?;
    }
    Ok(out)
}
