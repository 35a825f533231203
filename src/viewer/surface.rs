//! Page surfaces and the container they are inserted into

/// Background painted into a fresh surface before the page draws on it
pub const PAPER_WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Bytes per pixel in a surface buffer (opaque RGB)
pub const BYTES_PER_PIXEL: usize = 3;

/// Marks who owns a child of the viewer container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceTag {
    /// Produced by a render pass; removed at the start of the next one
    ViewerPage,
    /// Anything else the host put in the container (placeholders etc.)
    Foreign,
}

/// Drawable pixel buffer for one page.
///
/// Pixels are opaque RGB, row-major, no padding between rows.
#[derive(Clone)]
pub struct PageSurface {
    /// Page number (1-based)
    pub page: usize,
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
    /// Raw RGB pixel data
    pub pixels: Vec<u8>,
}

impl PageSurface {
    /// Allocate a white surface of the given pixel size
    #[must_use]
    pub fn new(page: usize, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        let mut pixels = Vec::with_capacity(len);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&PAPER_WHITE);
        }
        Self {
            page,
            width,
            height,
            pixels,
        }
    }

    /// Allocate a surface sized to fractional geometry, truncating toward zero
    #[must_use]
    pub fn for_geometry(page: usize, width: f32, height: f32) -> Self {
        Self::new(page, floor_px(width), floor_px(height))
    }

    #[must_use]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Copy an RGB image into the surface, anchored top-left.
    ///
    /// The source is cropped to the surface; uncovered area keeps its
    /// current contents.
    pub fn blit_rgb(&mut self, src: &[u8], src_width: u32, src_height: u32) {
        let copy_w = src_width.min(self.width) as usize * BYTES_PER_PIXEL;
        let rows = src_height.min(self.height) as usize;
        let src_stride = src_width as usize * BYTES_PER_PIXEL;
        let dst_stride = self.row_bytes();

        for y in 0..rows {
            let s = y * src_stride;
            let d = y * dst_stride;
            let Some(src_row) = src.get(s..s + copy_w) else {
                break;
            };
            self.pixels[d..d + copy_w].copy_from_slice(src_row);
        }
    }

    /// RGB value at a pixel, if inside the surface
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }
}

impl std::fmt::Debug for PageSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSurface")
            .field("page", &self.page)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels_len", &self.pixels.len())
            .finish()
    }
}

/// Truncate a fractional pixel extent toward zero; negatives and NaN become 0
#[must_use]
pub fn floor_px(extent: f32) -> u32 {
    if extent.is_finite() && extent > 0.0 {
        extent.trunc() as u32
    } else {
        0
    }
}

#[derive(Debug)]
struct Child {
    tag: SurfaceTag,
    surface: PageSurface,
}

/// Ordered children of the viewer region.
#[derive(Debug, Default)]
pub struct SurfaceContainer {
    children: Vec<Child>,
}

impl SurfaceContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered page as viewer output
    pub fn append(&mut self, surface: PageSurface) {
        self.children.push(Child {
            tag: SurfaceTag::ViewerPage,
            surface,
        });
    }

    /// Append a child the viewer does not own
    pub fn append_foreign(&mut self, surface: PageSurface) {
        self.children.push(Child {
            tag: SurfaceTag::Foreign,
            surface,
        });
    }

    /// Remove every viewer page, leaving foreign children in place.
    /// Returns how many surfaces were removed.
    pub fn clear_viewer_pages(&mut self) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.tag != SurfaceTag::ViewerPage);
        before - self.children.len()
    }

    /// Viewer pages in insertion order
    pub fn viewer_pages(&self) -> impl Iterator<Item = &PageSurface> {
        self.children
            .iter()
            .filter(|c| c.tag == SurfaceTag::ViewerPage)
            .map(|c| &c.surface)
    }

    #[must_use]
    pub fn viewer_page_count(&self) -> usize {
        self.viewer_pages().count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_is_truncated_toward_zero() {
        let surface = PageSurface::for_geometry(1, 612.9, 792.2);
        assert_eq!((surface.width, surface.height), (612, 792));
        assert_eq!(surface.pixels.len(), 612 * 792 * 3);

        assert_eq!(floor_px(-3.5), 0);
        assert_eq!(floor_px(f32::NAN), 0);
        assert_eq!(floor_px(0.99), 0);
    }

    #[test]
    fn new_surface_is_white() {
        let surface = PageSurface::new(1, 2, 2);
        assert_eq!(surface.pixel(1, 1), Some(PAPER_WHITE));
        assert_eq!(surface.pixel(2, 0), None);
    }

    #[test]
    fn blit_crops_larger_source() {
        let mut surface = PageSurface::new(1, 2, 2);
        // 3x3 source, all black
        let src = vec![0u8; 3 * 3 * 3];
        surface.blit_rgb(&src, 3, 3);
        assert!(surface.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn blit_leaves_uncovered_area() {
        let mut surface = PageSurface::new(1, 3, 2);
        let src = vec![0u8; 3];
        surface.blit_rgb(&src, 1, 1);
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(surface.pixel(1, 0), Some(PAPER_WHITE));
        assert_eq!(surface.pixel(0, 1), Some(PAPER_WHITE));
    }

    #[test]
    fn clearing_keeps_foreign_children() {
        let mut container = SurfaceContainer::new();
        container.append_foreign(PageSurface::new(0, 1, 1));
        container.append(PageSurface::new(1, 1, 1));
        container.append(PageSurface::new(2, 1, 1));

        assert_eq!(container.viewer_page_count(), 2);
        assert_eq!(container.clear_viewer_pages(), 2);
        assert_eq!(container.len(), 1);
        assert_eq!(container.viewer_page_count(), 0);
    }

    #[test]
    fn viewer_pages_preserve_order() {
        let mut container = SurfaceContainer::new();
        for page in 1..=3 {
            container.append(PageSurface::new(page, 1, 1));
        }
        let order: Vec<_> = container.viewer_pages().map(|s| s.page).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }
}
