//! Render service - owns the worker thread and the page cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flume::{Receiver, Sender};

use super::cache::{CacheKey, PageCache};
use super::engine::EngineFactory;
use super::request::{RenderRequest, RenderResponse, RequestId};
use super::types::PageData;
use super::worker::render_worker;

/// Number of rendered pages kept in memory
pub const DEFAULT_CACHE_SIZE: usize = 12;

/// Dispatches render requests to a worker thread and collects the results
pub struct RenderService {
    doc_path: PathBuf,
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    pending_requests: HashMap<RequestId, usize>,
    cache: Arc<Mutex<PageCache>>,
}

impl RenderService {
    #[must_use]
    pub fn new(doc_path: &Path, factory: EngineFactory, cache_size: usize) -> Self {
        let cache = Arc::new(Mutex::new(PageCache::new(cache_size)));
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let path = doc_path.to_path_buf();
        let cache_clone = cache.clone();
        std::thread::spawn(move || {
            render_worker(&path, factory, request_rx, response_tx, cache_clone);
        });

        Self {
            doc_path: doc_path.to_path_buf(),
            request_tx,
            response_rx,
            next_request_id: 1,
            pending_requests: HashMap::new(),
            cache,
        }
    }

    #[must_use]
    pub fn doc_path(&self) -> &Path {
        &self.doc_path
    }

    /// Request a page to be rendered
    pub fn request_page(&mut self, page: usize, zoom: f32) -> RequestId {
        let id = self.next_id();
        let _ = self
            .request_tx
            .send(RenderRequest::Page { id, page, zoom });
        self.pending_requests.insert(id, page);
        id
    }

    pub fn release_page(&self, page: usize) {
        let _ = self.request_tx.send(RenderRequest::Release(page));
    }

    pub fn invalidate_all(&self) {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .invalidate_all();
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending_requests.is_empty()
    }

    /// Collect every response that is already available
    pub fn poll_responses(&mut self) -> Vec<RenderResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            self.track(&response);
            responses.push(response);
        }
        responses
    }

    /// Block until one response arrives or the timeout elapses
    pub fn wait_response(&mut self, timeout: Duration) -> Option<RenderResponse> {
        let response = self.response_rx.recv_timeout(timeout).ok()?;
        self.track(&response);
        Some(response)
    }

    fn track(&mut self, response: &RenderResponse) {
        match response {
            RenderResponse::Page { id, .. } | RenderResponse::Error { id, .. } => {
                self.pending_requests.remove(id);
            }
            RenderResponse::EngineUnavailable(_) => self.pending_requests.clear(),
        }
    }

    /// Get a cached page if available
    #[must_use]
    pub fn cached_page(&self, page: usize, zoom: f32) -> Option<Arc<PageData>> {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&CacheKey::new(page, zoom))
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
