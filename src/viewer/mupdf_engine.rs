//! MuPDF-backed decoding engine
//!
//! The async side holds only a request sender. Each call sends one request
//! with a private reply channel and awaits the answer, so the single-threaded
//! executor keeps running other tasks while the worker decodes or paints.

use std::cell::RefCell;

use async_trait::async_trait;
use flume::Sender;
use log::{debug, error, info};

use super::engine::{
    DocumentEngine, DocumentHandle, DrawInstructions, OpenOptions, PageHandle, Viewport,
};
use super::error::{ViewerError, ViewerResult};
use super::request::{EngineFault, EngineRequest, Reply};
use super::surface::PageSurface;
use super::worker::engine_worker;

const WORKER_THREAD_NAME: &str = "folio-engine";

/// Decoding engine that forwards work to a dedicated MuPDF thread
pub struct MupdfEngine {
    endpoint: RefCell<Option<Sender<EngineRequest>>>,
}

impl Default for MupdfEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MupdfEngine {
    /// Engine with no worker yet; `open` fails until `configure_worker` runs
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: RefCell::new(None),
        }
    }

    /// Engine with its worker already running
    #[must_use]
    pub fn spawn() -> Self {
        let engine = Self::new();
        engine.configure_worker();
        engine
    }

    /// Start the worker thread if it is not running. Returns whether the
    /// engine is ready afterwards.
    pub fn configure_worker(&self) -> bool {
        if self.endpoint.borrow().is_some() {
            return true;
        }

        let (request_tx, request_rx) = flume::unbounded();
        let spawned = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || engine_worker(request_rx));

        match spawned {
            Ok(_) => {
                info!("Started {WORKER_THREAD_NAME} worker");
                *self.endpoint.borrow_mut() = Some(request_tx);
                true
            }
            Err(e) => {
                error!("Failed to start {WORKER_THREAD_NAME} worker: {e}");
                false
            }
        }
    }

    fn sender(&self) -> ViewerResult<Sender<EngineRequest>> {
        self.endpoint
            .borrow()
            .clone()
            .ok_or(ViewerError::EngineUnavailable)
    }
}

impl Drop for MupdfEngine {
    fn drop(&mut self) {
        if let Some(tx) = self.endpoint.get_mut().take() {
            let _ = tx.send(EngineRequest::Shutdown);
        }
    }
}

/// Send a request and await its reply.
///
/// A dead worker maps to `EngineUnavailable`; worker faults go through `fault`.
async fn roundtrip<T>(
    tx: &Sender<EngineRequest>,
    build: impl FnOnce(Reply<T>) -> EngineRequest,
    fault: impl FnOnce(EngineFault) -> ViewerError,
) -> ViewerResult<T> {
    let (reply_tx, reply_rx) = flume::bounded(1);
    tx.send(build(reply_tx))
        .map_err(|_| ViewerError::EngineUnavailable)?;
    match reply_rx.recv_async().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(fault(e)),
        Err(_) => Err(ViewerError::EngineUnavailable),
    }
}

#[async_trait(?Send)]
impl DocumentEngine for MupdfEngine {
    fn is_ready(&self) -> bool {
        self.endpoint.borrow().is_some()
    }

    async fn open(
        &self,
        bytes: Vec<u8>,
        options: &OpenOptions,
    ) -> ViewerResult<Box<dyn DocumentHandle>> {
        let tx = self.sender()?;
        debug!("Opening {} bytes ({options:?})", bytes.len());
        let page_count = roundtrip(
            &tx,
            |reply| EngineRequest::Open { bytes, reply },
            |e| ViewerError::Decode(e.to_string()),
        )
        .await?;
        Ok(Box::new(MupdfDocument {
            requests: tx,
            page_count,
        }))
    }
}

struct MupdfDocument {
    requests: Sender<EngineRequest>,
    page_count: usize,
}

#[async_trait(?Send)]
impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn page(&self, number: usize) -> ViewerResult<Box<dyn PageHandle>> {
        let size = roundtrip(
            &self.requests,
            |reply| EngineRequest::Page { number, reply },
            |e| ViewerError::page_render(number, e.to_string()),
        )
        .await?;
        Ok(Box::new(MupdfPage {
            requests: self.requests.clone(),
            number,
            size,
        }))
    }
}

struct MupdfPage {
    requests: Sender<EngineRequest>,
    number: usize,
    /// Unscaled size in points
    size: (f32, f32),
}

#[async_trait(?Send)]
impl PageHandle for MupdfPage {
    fn number(&self) -> usize {
        self.number
    }

    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::from_page_size(self.number, self.size, scale)
    }

    async fn render(&self, surface: &mut PageSurface, viewport: &Viewport) -> ViewerResult<()> {
        let DrawInstructions { page: number, scale } = viewport.draw;
        let image = roundtrip(
            &self.requests,
            |reply| EngineRequest::Paint {
                number,
                scale,
                reply,
            },
            |e| ViewerError::page_render(number, e.to_string()),
        )
        .await?;
        surface.blit_rgb(&image.pixels, image.width, image.height);
        Ok(())
    }
}
