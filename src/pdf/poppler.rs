//! Page engine backed by the poppler command-line tools
//!
//! `pdfinfo` reports page counts and sizes, `pdftoppm` rasterizes, and
//! `pdftotext -bbox-layout` provides word boxes for the text layer.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use roxmltree::{Document, Node, ParsingOptions};

use super::engine::{EngineError, PageEngine};
use super::types::{PageData, PageRaster, PageSize, TextItem, TextLayer};

/// PDF user-space units per inch
const POINTS_PER_INCH: f32 = 72.0;

/// Program names for the poppler tools
#[derive(Clone, Debug)]
pub struct PopplerTools {
    pub pdfinfo: String,
    pub pdftoppm: String,
    pub pdftotext: String,
}

impl Default for PopplerTools {
    fn default() -> Self {
        Self {
            pdfinfo: "pdfinfo".to_string(),
            pdftoppm: "pdftoppm".to_string(),
            pdftotext: "pdftotext".to_string(),
        }
    }
}

pub struct PopplerEngine {
    path: PathBuf,
    tools: PopplerTools,
    page_count: OnceCell<usize>,
}

impl PopplerEngine {
    #[must_use]
    pub fn new(path: &Path, tools: PopplerTools) -> Self {
        Self {
            path: path.to_path_buf(),
            tools,
            page_count: OnceCell::new(),
        }
    }

    fn check_page(&self, page: usize) -> Result<(), EngineError> {
        let count = self.page_count()?;
        if page == 0 || page > count {
            return Err(EngineError::PageOutOfRange { page, count });
        }
        Ok(())
    }
}

impl PageEngine for PopplerEngine {
    fn page_count(&self) -> Result<usize, EngineError> {
        if let Some(count) = self.page_count.get() {
            return Ok(*count);
        }
        let output = run_tool(&self.tools.pdfinfo, &[self.path.as_os_str().to_owned()])?;
        let count = parse_page_count(&output)
            .ok_or_else(|| EngineError::Parse("pdfinfo reported no page count".to_string()))?;
        let _ = self.page_count.set(count);
        Ok(count)
    }

    fn page_size(&self, page: usize) -> Result<PageSize, EngineError> {
        self.check_page(page)?;
        let page_arg = page.to_string();
        let output = run_tool(
            &self.tools.pdfinfo,
            &[
                "-f".into(),
                page_arg.clone().into(),
                "-l".into(),
                page_arg.into(),
                self.path.as_os_str().to_owned(),
            ],
        )?;
        parse_page_size(&output)
            .ok_or_else(|| EngineError::Parse(format!("pdfinfo reported no size for page {page}")))
    }

    fn text_layer(&self, page: usize) -> Result<TextLayer, EngineError> {
        self.check_page(page)?;
        let page_arg = page.to_string();
        let output = run_tool(
            &self.tools.pdftotext,
            &[
                "-bbox-layout".into(),
                "-f".into(),
                page_arg.clone().into(),
                "-l".into(),
                page_arg.into(),
                self.path.as_os_str().to_owned(),
                "-".into(),
            ],
        )?;
        parse_bbox_layout(&output)
    }

    fn render_page(&self, page: usize, zoom: f32) -> Result<PageData, EngineError> {
        self.check_page(page)?;
        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join("page");
        let page_arg = page.to_string();
        let dpi = format!("{:.2}", POINTS_PER_INCH * zoom);

        run_tool(
            &self.tools.pdftoppm,
            &[
                "-png".into(),
                "-r".into(),
                dpi.into(),
                "-f".into(),
                page_arg.clone().into(),
                "-l".into(),
                page_arg.into(),
                "-singlefile".into(),
                self.path.as_os_str().to_owned(),
                prefix.as_os_str().to_owned(),
            ],
        )?;

        let png = std::fs::read(prefix.with_extension("png"))?;
        let size = imagesize::blob_size(&png)
            .map_err(|e| EngineError::Parse(format!("unreadable page image: {e:?}")))?;

        let spans = match self.text_layer(page) {
            Ok(layer) => layer.positioned(zoom),
            Err(e) => {
                warn!("Text layer unavailable for page {page}: {e}");
                Vec::new()
            }
        };

        Ok(PageData {
            page_num: page,
            zoom,
            raster: PageRaster {
                png,
                width_px: size.width as u32,
                height_px: size.height as u32,
            },
            spans,
        })
    }
}

/// Run a tool to completion and return its stdout
pub(crate) fn run_tool(program: &str, args: &[std::ffi::OsString]) -> Result<String, EngineError> {
    debug!("Running {program} {args:?}");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| EngineError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(EngineError::Exit {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse the `Pages:` line of `pdfinfo` output
pub(crate) fn parse_page_count(output: &str) -> Option<usize> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() == "Pages" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

/// Parse `Page size: W x H pts` or `Page    N size: W x H pts`
pub(crate) fn parse_page_size(output: &str) -> Option<PageSize> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let key = key.trim();
        if !(key.starts_with("Page") && key.ends_with("size")) {
            return None;
        }
        let mut parts = value.split_whitespace();
        let width: f32 = parts.next()?.parse().ok()?;
        if parts.next()? != "x" {
            return None;
        }
        let height: f32 = parts.next()?.parse().ok()?;
        Some(PageSize::new(width, height))
    })
}

/// Turn `pdftotext -bbox-layout` XHTML into a text layer.
///
/// Each word becomes one item; the last word of every `<line>` ends the line.
pub(crate) fn parse_bbox_layout(xhtml: &str) -> Result<TextLayer, EngineError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = Document::parse_with_options(xhtml, options)
        .map_err(|e| EngineError::Parse(e.to_string()))?;

    let Some(page) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "page")
    else {
        return Ok(TextLayer::default());
    };
    let page_height = attr_f32(&page, "height").unwrap_or(0.0);

    let mut items = Vec::new();
    for line in page
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "line")
    {
        let words: Vec<Node> = line
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "word")
            .collect();
        let last = words.len().saturating_sub(1);
        for (i, word) in words.iter().enumerate() {
            let (Some(x0), Some(y0), Some(x1), Some(y1)) = (
                attr_f32(word, "xMin"),
                attr_f32(word, "yMin"),
                attr_f32(word, "xMax"),
                attr_f32(word, "yMax"),
            ) else {
                continue;
            };
            let text: String = word.text().unwrap_or_default().to_string();
            if text.is_empty() {
                continue;
            }
            let height = (y1 - y0).max(0.0);
            items.push(TextItem {
                text,
                transform: [height, 0.0, 0.0, height, x0, page_height - y1],
                width: (x1 - x0).max(0.0),
                has_eol: i == last,
            });
        }
    }

    Ok(TextLayer { page_height, items })
}

fn attr_f32(node: &Node, name: &str) -> Option<f32> {
    node.attribute(name).and_then(|v| v.parse().ok())
}
