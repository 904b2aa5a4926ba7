#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use readhelper::Reader;
use readhelper::pdf::{
    EngineError, EngineFactory, PageData, PageEngine, PageRaster, PageSize, TextItem, TextLayer,
};
use readhelper::settings::Settings;
use readhelper::speech::{SpeechError, Speaker};
use readhelper::store::Stores;
use tempfile::TempDir;

pub const PAGE: PageSize = PageSize::new(600.0, 800.0);

/// Every `render_page` call as (page, zoom)
pub type RenderLog = Arc<Mutex<Vec<(usize, f32)>>>;

/// In-memory document: blank pages, with "Total: 42" near the top of page 1
pub struct FakeEngine {
    pages: usize,
    renders: RenderLog,
}

impl PageEngine for FakeEngine {
    fn page_count(&self) -> Result<usize, EngineError> {
        Ok(self.pages)
    }

    fn page_size(&self, _page: usize) -> Result<PageSize, EngineError> {
        Ok(PAGE)
    }

    fn text_layer(&self, page: usize) -> Result<TextLayer, EngineError> {
        let items = if page == 1 {
            // box spans x 100..160, y 88..100 in top-left coordinates
            vec![TextItem {
                text: "Total:  42".to_string(),
                transform: [12.0, 0.0, 0.0, 12.0, 100.0, 700.0],
                width: 60.0,
                has_eol: true,
            }]
        } else {
            Vec::new()
        };
        Ok(TextLayer {
            page_height: PAGE.height,
            items,
        })
    }

    fn render_page(&self, page: usize, zoom: f32) -> Result<PageData, EngineError> {
        if page == 0 || page > self.pages {
            return Err(EngineError::PageOutOfRange {
                page,
                count: self.pages,
            });
        }
        self.renders.lock().unwrap().push((page, zoom));
        let (width_px, height_px) = PAGE.scaled(zoom);
        Ok(PageData {
            page_num: page,
            zoom,
            raster: PageRaster {
                png: format!("page {page}").into_bytes(),
                width_px,
                height_px,
            },
            spans: self.text_layer(page)?.positioned(zoom),
        })
    }
}

pub fn fake_factory(pages: usize) -> (EngineFactory, RenderLog) {
    let renders: RenderLog = Arc::default();
    (logging_factory(pages, Arc::clone(&renders)), renders)
}

pub fn logging_factory(pages: usize, renders: RenderLog) -> EngineFactory {
    Arc::new(
        move |_path: &Path| -> Result<Box<dyn PageEngine>, EngineError> {
            Ok(Box::new(FakeEngine {
                pages,
                renders: Arc::clone(&renders),
            }))
        },
    )
}

pub struct Silent;

impl Speaker for Silent {
    fn start(&mut self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }
    fn pause(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
    fn resume(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
    fn stop(&mut self) {}
    fn is_active(&mut self) -> bool {
        true
    }
}

/// Settings that never reach the network or real poppler tools
pub fn offline_settings() -> Settings {
    let mut settings = Settings::default();
    settings.extractor.pdftotext = "readhelper-missing-pdftotext".to_string();
    settings.translation.endpoint = "http://127.0.0.1:9/v2/translate".to_string();
    settings.translation.timeout_secs = 2;
    settings
}

pub struct Fixture {
    pub dir: TempDir,
    pub renders: RenderLog,
}

impl Fixture {
    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Write a document into the fixture directory
    pub fn file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Reader over a ten page fake PDF engine and the fixture's data directory
    pub fn reader(&self, settings: Settings) -> Reader {
        Reader::new(
            settings,
            Stores::in_dir(&self.data_dir()),
            logging_factory(10, Arc::clone(&self.renders)),
            Box::new(Silent),
        )
    }
}

pub fn fixture() -> Fixture {
    Fixture {
        dir: TempDir::new().unwrap(),
        renders: Arc::default(),
    }
}
