//! Ways of turning a page region into text

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::debug;

use crate::pdf::{DocRect, EngineError, PageEngine, TextLayer, run_tool};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("no extraction strategy available")]
    NoStrategy,
}

/// One step of the extraction fallback chain.
///
/// Returning an empty string means "nothing here", and the next strategy
/// gets its turn just as it would after an error.
pub trait RegionExtractor {
    fn name(&self) -> &'static str;

    fn extract(&self, page: usize, rect: &DocRect) -> Result<String, ExtractError>;
}

/// Region mode of the external `pdftotext` tool
pub struct PdftotextExtractor {
    program: String,
    doc_path: PathBuf,
}

impl PdftotextExtractor {
    pub fn new(program: impl Into<String>, doc_path: &Path) -> Self {
        Self {
            program: program.into(),
            doc_path: doc_path.to_path_buf(),
        }
    }

    /// Arguments for one page region; coordinates are whole document units
    pub fn arguments(&self, page: usize, rect: &DocRect) -> Vec<OsString> {
        let x = rect.x.max(0.0).floor() as i64;
        let y = rect.y.max(0.0).floor() as i64;
        let w = (rect.right() - x as f32).ceil().max(1.0) as i64;
        let h = (rect.bottom() - y as f32).ceil().max(1.0) as i64;
        let page = page.to_string();

        let mut args: Vec<OsString> = Vec::with_capacity(16);
        for (flag, value) in [
            ("-f", page.clone()),
            ("-l", page),
            ("-x", x.to_string()),
            ("-y", y.to_string()),
            ("-W", w.to_string()),
            ("-H", h.to_string()),
        ] {
            args.push(flag.into());
            args.push(value.into());
        }
        args.push("-layout".into());
        args.push(self.doc_path.as_os_str().to_owned());
        args.push("-".into());
        args
    }
}

impl RegionExtractor for PdftotextExtractor {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn extract(&self, page: usize, rect: &DocRect) -> Result<String, ExtractError> {
        let stdout = run_tool(&self.program, &self.arguments(page, rect))?;
        Ok(stdout.trim().to_string())
    }
}

/// Scan the page's text items for boxes overlapping the region
pub struct TextLayerExtractor {
    engine: Box<dyn PageEngine>,
}

impl TextLayerExtractor {
    pub fn new(engine: Box<dyn PageEngine>) -> Self {
        Self { engine }
    }
}

impl RegionExtractor for TextLayerExtractor {
    fn name(&self) -> &'static str {
        "text-layer"
    }

    fn extract(&self, page: usize, rect: &DocRect) -> Result<String, ExtractError> {
        let layer = self.engine.text_layer(page)?;
        Ok(collect_overlapping(&layer, rect))
    }
}

/// Concatenate, in document order, every item whose box strictly overlaps `rect`.
/// Items that end a line are followed by a newline, the rest by a space.
pub fn collect_overlapping(layer: &TextLayer, rect: &DocRect) -> String {
    let mut out = String::new();
    let mut matched = 0usize;
    for item in &layer.items {
        let (x0, y0, x1, y1) = item.bounds(layer.page_height);
        if !rect.overlaps(x0, y0, x1, y1) {
            continue;
        }
        matched += 1;
        out.push_str(&item.text);
        out.push(if item.has_eol { '\n' } else { ' ' });
    }
    debug!(
        "Text layer scan matched {matched} of {} items",
        layer.items.len()
    );
    out.trim().to_string()
}
