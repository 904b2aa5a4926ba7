//! Region extraction: from a rectangle drawn over a PDF page to clean text

mod normalize;
mod record;
mod strategy;

use log::{debug, info, warn};

use crate::pdf::{DisplayRect, DocRect};
use crate::services::ServiceError;

pub use normalize::normalize;
pub(crate) use normalize::is_cjk;
pub use record::{ExtractionLog, ExtractionRecord, Marker};
pub use strategy::{
    ExtractError, PdftotextExtractor, RegionExtractor, TextLayerExtractor, collect_overlapping,
};

/// Shown instead of an empty result when no strategy finds any text
pub const NO_TEXT_DETECTED: &str = "No text detected in the selected region";

/// Remote cleanup of already normalized text
pub trait TextRefiner {
    fn refine(&self, text: &str) -> Result<String, ServiceError>;
}

/// Result of one extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The rectangle was below the minimum size and was discarded
    TooSmall,
    /// Every strategy came back empty
    NoText,
    Extracted(ExtractionRecord),
}

impl ExtractionOutcome {
    /// Text to show the user for this outcome
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::TooSmall => None,
            Self::NoText => Some(NO_TEXT_DETECTED),
            Self::Extracted(record) => Some(&record.text),
        }
    }
}

/// Ordered strategy chain plus the optional refinement step
pub struct ExtractionPipeline {
    strategies: Vec<Box<dyn RegionExtractor>>,
    refiner: Option<Box<dyn TextRefiner>>,
}

impl ExtractionPipeline {
    pub fn new(strategies: Vec<Box<dyn RegionExtractor>>) -> Self {
        Self {
            strategies,
            refiner: None,
        }
    }

    #[must_use]
    pub fn with_refiner(mut self, refiner: Box<dyn TextRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First non-empty result of the strategy chain
    pub fn extract_raw(&self, page: usize, rect: &DocRect) -> Result<Option<String>, ExtractError> {
        if self.strategies.is_empty() {
            return Err(ExtractError::NoStrategy);
        }
        for strategy in &self.strategies {
            match strategy.extract(page, rect) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("{} extracted {} bytes from page {page}", strategy.name(), text.len());
                    return Ok(Some(text));
                }
                Ok(_) => debug!("{} found no text on page {page}", strategy.name()),
                Err(e) => warn!("{} failed on page {page}: {e}", strategy.name()),
            }
        }
        Ok(None)
    }

    /// Normalize locally, then let the refiner have a go if there is one
    pub fn clean(&self, raw: &str) -> String {
        let normalized = normalize(raw);
        let Some(refiner) = &self.refiner else {
            return normalized;
        };
        match refiner.refine(&normalized) {
            Ok(refined) if !refined.trim().is_empty() => refined.trim().to_string(),
            Ok(_) => {
                warn!("Refinement returned no text, keeping local normalization");
                normalized
            }
            Err(e) => {
                warn!("Refinement failed, keeping local normalization: {e}");
                normalized
            }
        }
    }

    /// Extract the region drawn at `display` (pixels at `zoom`) on `page`
    /// and record the result in `log`.
    pub fn run(
        &self,
        log: &mut ExtractionLog,
        page: usize,
        display: DisplayRect,
        zoom: f32,
    ) -> Result<ExtractionOutcome, ExtractError> {
        if !display.is_usable() {
            debug!("Discarding {display:?}: below minimum region size");
            return Ok(ExtractionOutcome::TooSmall);
        }
        let rect = display.to_document(zoom);

        let Some(raw) = self.extract_raw(page, &rect)? else {
            info!("No text found on page {page} in {rect:?}");
            return Ok(ExtractionOutcome::NoText);
        };

        let text = self.clean(&raw);
        let record = log.push(page, text, rect, display).clone();
        info!("Extraction #{} recorded from page {page}", record.id);
        Ok(ExtractionOutcome::Extracted(record))
    }
}
