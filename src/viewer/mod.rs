//! Paginated document viewer: lazy load, zoom, full re-render passes

mod engine;
mod error;
mod panel;
mod session;
mod source;
mod surface;
mod trigger;
mod zoom;

#[cfg(feature = "pdf")]
mod mupdf_engine;
#[cfg(feature = "pdf")]
mod request;
#[cfg(feature = "pdf")]
mod worker;

pub use engine::{DocumentEngine, DocumentHandle, DrawInstructions, OpenOptions, PageHandle, Viewport};
pub use error::{ViewerError, ViewerResult};
pub use panel::ViewerPanel;
pub use session::{DEFAULT_DOCUMENT_LOCATION, RenderOutcome, SessionConfig, ViewerSession};
pub use source::{
    DocumentSource, FetchedDocument, FileSource, SNIPPET_LEN, SourceLocation, sniff_content_type,
    snippet, validate,
};
pub use surface::{PAPER_WHITE, PageSurface, SurfaceContainer, SurfaceTag, floor_px};
pub use trigger::{DEFAULT_VISIBILITY_THRESHOLD, TriggerState, VisibilityTrigger};
pub use zoom::Zoom;

#[cfg(feature = "pdf")]
pub use mupdf_engine::MupdfEngine;
