//! Render request and response types

use std::sync::Arc;

use super::engine::EngineError;
use super::types::PageData;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Render a page (1-indexed) at a zoom factor
    Page { id: RequestId, page: usize, zoom: f32 },

    /// Let the engine drop per-page state
    Release(usize),

    /// Shutdown the worker
    Shutdown,
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Rendered page data
    Page {
        id: RequestId,
        page: usize,
        zoom: f32,
        data: Arc<PageData>,
    },

    /// Error during rendering
    Error {
        id: RequestId,
        page: usize,
        zoom: f32,
        error: EngineError,
    },

    /// The worker could not open the document at all
    EngineUnavailable(String),
}
