//! Decoding engine capability
//!
//! The viewer never decodes documents itself. It talks to an engine through
//! these traits so the MuPDF worker and in-memory fakes are interchangeable.
//! Everything runs on one thread; futures are not required to be `Send`.

use async_trait::async_trait;

use super::error::ViewerResult;
use super::surface::PageSurface;

/// Options passed through to the engine when opening a document
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Do not fetch the remaining bytes in the background
    pub disable_auto_fetch: bool,
    /// Do not stream the document while it downloads
    pub disable_stream: bool,
}

/// Engine-specific data needed to paint one page at one scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawInstructions {
    /// Page number (1-based)
    pub page: usize,
    /// Scale the geometry was resolved at
    pub scale: f32,
}

/// Scaled page geometry. Dimensions are fractional pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub draw: DrawInstructions,
}

impl Viewport {
    /// Scale unscaled page dimensions (points) by `scale`
    #[must_use]
    pub fn from_page_size(page: usize, size: (f32, f32), scale: f32) -> Self {
        Self {
            width: size.0 * scale,
            height: size.1 * scale,
            draw: DrawInstructions { page, scale },
        }
    }
}

#[async_trait(?Send)]
pub trait DocumentEngine {
    /// Whether the worker endpoint has been configured
    fn is_ready(&self) -> bool;

    /// Decode a document from its bytes
    async fn open(
        &self,
        bytes: Vec<u8>,
        options: &OpenOptions,
    ) -> ViewerResult<Box<dyn DocumentHandle>>;
}

#[async_trait(?Send)]
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    /// Fetch a page by 1-based number
    async fn page(&self, number: usize) -> ViewerResult<Box<dyn PageHandle>>;
}

#[async_trait(?Send)]
pub trait PageHandle {
    fn number(&self) -> usize;

    /// Resolve geometry and draw instructions at `scale`
    fn viewport(&self, scale: f32) -> Viewport;

    /// Paint the page onto `surface`
    async fn render(&self, surface: &mut PageSurface, viewport: &Viewport) -> ViewerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_scales_page_size() {
        let vp = Viewport::from_page_size(2, (612.0, 792.0), 1.5);
        assert_eq!(vp.width, 918.0);
        assert_eq!(vp.height, 1188.0);
        assert_eq!(vp.draw, DrawInstructions { page: 2, scale: 1.5 });
    }
}
