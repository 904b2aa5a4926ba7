//! PDF render worker - runs in a separate thread

use std::path::Path;
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, error};

use super::cache::{CacheKey, PageCache};
use super::engine::{EngineFactory, PageEngine};
use super::request::{RenderRequest, RenderResponse, RequestId};

/// Main worker function - opens its own engine and serves requests until shutdown
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(
    doc_path: &Path,
    factory: EngineFactory,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    cache: Arc<Mutex<PageCache>>,
) {
    let engine = match factory(doc_path) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Render worker could not open {doc_path:?}: {e}");
            let _ = responses.send(RenderResponse::EngineUnavailable(e.to_string()));
            return;
        }
    };

    for request in requests {
        match request {
            RenderRequest::Page { id, page, zoom } => {
                handle_page_request(engine.as_ref(), id, page, zoom, &cache, &responses);
            }

            RenderRequest::Release(page) => engine.release_page(page),

            RenderRequest::Shutdown => break,
        }
    }
    debug!("Render worker for {doc_path:?} stopped");
}

fn handle_page_request(
    engine: &dyn PageEngine,
    id: RequestId,
    page: usize,
    zoom: f32,
    cache: &Arc<Mutex<PageCache>>,
    responses: &Sender<RenderResponse>,
) {
    let key = CacheKey::new(page, zoom);

    let cached = cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key);
    if let Some(data) = cached {
        let _ = responses.send(RenderResponse::Page {
            id,
            page,
            zoom,
            data,
        });
        return;
    }

    match engine.render_page(page, zoom) {
        Ok(data) => {
            let data = cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key, data);
            let _ = responses.send(RenderResponse::Page {
                id,
                page,
                zoom,
                data,
            });
        }
        Err(error) => {
            let _ = responses.send(RenderResponse::Error {
                id,
                page,
                zoom,
                error,
            });
        }
    }
}
