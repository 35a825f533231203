//! MuPDF engine worker - runs in its own thread
//!
//! `mupdf::Document` is not `Send`, so the document lives here for its whole
//! life and the viewer only ever sees page sizes and RGB pixels.

use flume::Receiver;
use log::{debug, warn};
use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};

use super::request::{EngineFault, EngineRequest, RasterImage};

const PDF_MIME: &str = "application/pdf";

/// Main worker function - runs until `Shutdown` or until every sender is gone
#[expect(
    clippy::needless_pass_by_value,
    reason = "Receiver moved into thread, need ownership"
)]
pub fn engine_worker(requests: Receiver<EngineRequest>) {
    let mut doc: Option<Document> = None;

    for request in requests.iter() {
        match request {
            EngineRequest::Open { bytes, reply } => {
                let result = open_document(&bytes).map(|(opened, pages)| {
                    doc = Some(opened);
                    pages
                });
                let _ = reply.send(result);
            }

            EngineRequest::Page { number, reply } => {
                let result = doc
                    .as_ref()
                    .ok_or(EngineFault::NoDocument)
                    .and_then(|d| page_size(d, number));
                let _ = reply.send(result);
            }

            EngineRequest::Paint {
                number,
                scale,
                reply,
            } => {
                let result = doc
                    .as_ref()
                    .ok_or(EngineFault::NoDocument)
                    .and_then(|d| paint_page(d, number, scale));
                let _ = reply.send(result);
            }

            EngineRequest::Shutdown => break,
        }
    }

    debug!("Engine worker exiting");
}

fn open_document(bytes: &[u8]) -> Result<(Document, usize), EngineFault> {
    let doc = Document::from_bytes(bytes, PDF_MIME)?;
    let pages = doc.page_count()?;
    let pages = usize::try_from(pages)
        .map_err(|_| EngineFault::generic(format!("Invalid page count: {pages}")))?;
    debug!("Decoded {} bytes into {pages} pages", bytes.len());
    Ok((doc, pages))
}

fn load_page(doc: &Document, number: usize) -> Result<Page, EngineFault> {
    let pages = doc.page_count()?;
    let index = number
        .checked_sub(1)
        .and_then(|i| i32::try_from(i).ok())
        .filter(|&i| i < pages)
        .ok_or_else(|| EngineFault::generic(format!("Page {number} out of range 1..={pages}")))?;
    Ok(doc.load_page(index)?)
}

fn page_size(doc: &Document, number: usize) -> Result<(f32, f32), EngineFault> {
    let page = load_page(doc, number)?;
    let bounds = page.bounds()?;
    Ok((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0))
}

/// Render a single page
fn paint_page(doc: &Document, number: usize, scale: f32) -> Result<RasterImage, EngineFault> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(EngineFault::generic(format!("Invalid scale {scale}")));
    }

    let page = load_page(doc, number)?;
    let transform = Matrix::new_scale(scale, scale);
    let rgb = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&transform, &rgb, false, false)?;

    let pixels = pixmap_to_rgb(&pixmap)?;
    if pixels.is_empty() {
        warn!("Page {number} rasterized to an empty pixmap");
    }

    Ok(RasterImage {
        pixels,
        width: pixmap.width(),
        height: pixmap.height(),
    })
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, EngineFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(EngineFault::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    let expected_min = stride.saturating_mul(height);
    if samples.len() < expected_min || row_bytes > stride {
        return Err(EngineFault::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
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
