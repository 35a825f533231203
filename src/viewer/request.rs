//! Engine worker request and reply types

use flume::Sender;

/// Errors from the engine worker
#[derive(Debug, thiserror::Error)]
pub enum EngineFault {
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("no document is open")]
    NoDocument,

    #[error("{detail}")]
    Generic { detail: String },
}

impl EngineFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

pub type Reply<T> = Sender<Result<T, EngineFault>>;

/// Opaque RGB pixels produced by the worker
#[derive(Clone)]
pub struct RasterImage {
    /// Raw RGB pixel data (3 bytes per pixel: R, G, B)
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels_len", &self.pixels.len())
            .finish()
    }
}

/// Request sent to the engine worker. Every request carries its own reply
/// channel; the worker answers requests in the order received.
#[derive(Debug)]
pub enum EngineRequest {
    /// Decode a document, replacing any previously open one. Replies with
    /// the page count.
    Open { bytes: Vec<u8>, reply: Reply<usize> },

    /// Load a page (1-based) and reply with its unscaled size in points
    Page { number: usize, reply: Reply<(f32, f32)> },

    /// Rasterize a page (1-based) at `scale`
    Paint {
        number: usize,
        scale: f32,
        reply: Reply<RasterImage>,
    },

    /// Stop the worker
    Shutdown,
}
