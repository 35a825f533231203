//! Viewer chrome: loading/error indicators, zoom label, surface container

use super::surface::SurfaceContainer;
use super::zoom::Zoom;

/// Everything the host draws for the viewer region
#[derive(Debug)]
pub struct ViewerPanel {
    pub loading_visible: bool,
    pub error_visible: bool,
    /// Reason shown inside the error indicator, if any
    pub error_message: Option<String>,
    pub zoom_label: String,
    pub zoom_label_visible: bool,
    pub container: SurfaceContainer,
}

impl Default for ViewerPanel {
    fn default() -> Self {
        Self {
            loading_visible: true,
            error_visible: false,
            error_message: None,
            zoom_label: Zoom::default().label(),
            zoom_label_visible: false,
            container: SurfaceContainer::new(),
        }
    }
}

impl ViewerPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Document opened: label on, both indicators off
    pub fn show_ready(&mut self, zoom_label: String) {
        self.zoom_label = zoom_label;
        self.zoom_label_visible = true;
        self.loading_visible = false;
        self.error_visible = false;
        self.error_message = None;
    }

    pub fn set_zoom_label(&mut self, zoom_label: String) {
        self.zoom_label = zoom_label;
    }

    /// A later pass rendered every page
    pub fn clear_error(&mut self) {
        self.error_visible = false;
        self.error_message = None;
    }

    /// Load or render failed
    pub fn show_error(&mut self, message: Option<String>) {
        self.loading_visible = false;
        self.error_visible = true;
        self.error_message = message;
    }
}
