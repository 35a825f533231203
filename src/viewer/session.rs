//! Viewer session - owns document, zoom and panel state, drives render passes
//!
//! A session is single-threaded. Its async operations take `&self` and keep
//! their state in cells, so a host can poll a load and several zoom
//! re-renders concurrently on one local executor. Overlapping render passes
//! are resolved with a generation counter: only the most recently started
//! pass may commit surfaces to the container.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use log::{debug, error, info, warn};

use super::engine::{DocumentEngine, DocumentHandle, OpenOptions};
use super::error::{ViewerError, ViewerResult};
use super::panel::ViewerPanel;
use super::source::{self, DocumentSource, SourceLocation};
use super::surface::PageSurface;
use super::trigger::{DEFAULT_VISIBILITY_THRESHOLD, TriggerState, VisibilityTrigger};
use super::zoom::Zoom;

/// Default document location, relative to the host page
pub const DEFAULT_DOCUMENT_LOCATION: &str = "./assets/portfolio.pdf";

/// Construction-time configuration for a session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub location: SourceLocation,
    /// Path the host page is served from, used by host-prefixed locations
    pub host_path: String,
    pub initial_scale: f32,
    pub visibility_threshold: f32,
    /// Check status and content type before handing bytes to the engine
    pub validate_source: bool,
    pub open_options: OpenOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            location: SourceLocation::Fixed(DEFAULT_DOCUMENT_LOCATION.to_string()),
            host_path: "/".to_string(),
            initial_scale: Zoom::DEFAULT_SCALE,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            validate_source: true,
            open_options: OpenOptions::default(),
        }
    }
}

/// How a render request ended, when it did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Every page was painted and appended
    Completed { pages: usize },
    /// A newer pass started; this one stopped after committing `committed` pages
    Superseded { committed: usize },
    /// Nothing to do (no document, or load already started)
    Skipped,
}

pub struct ViewerSession {
    engine: Box<dyn DocumentEngine>,
    source: Box<dyn DocumentSource>,
    config: SessionConfig,
    zoom: Cell<Zoom>,
    document: RefCell<Option<Rc<dyn DocumentHandle>>>,
    panel: RefCell<ViewerPanel>,
    trigger: RefCell<VisibilityTrigger>,
    generation: Cell<u64>,
    load_started: Cell<bool>,
}

impl ViewerSession {
    #[must_use]
    pub fn new(
        engine: Box<dyn DocumentEngine>,
        source: Box<dyn DocumentSource>,
        config: SessionConfig,
    ) -> Rc<Self> {
        let zoom = Zoom::new(config.initial_scale);
        let trigger = VisibilityTrigger::new(config.visibility_threshold);
        Rc::new(Self {
            engine,
            source,
            config,
            zoom: Cell::new(zoom),
            document: RefCell::new(None),
            panel: RefCell::new(ViewerPanel::new()),
            trigger: RefCell::new(trigger),
            generation: Cell::new(0),
            load_started: Cell::new(false),
        })
    }

    /// Current panel state; do not hold across an await
    pub fn panel(&self) -> Ref<'_, ViewerPanel> {
        self.panel.borrow()
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.zoom.get().factor()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.document.borrow().is_some()
    }

    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        self.document.borrow().as_ref().map(|d| d.page_count())
    }

    #[must_use]
    pub fn trigger_state(&self) -> TriggerState {
        self.trigger.borrow().state()
    }

    /// Number of render passes started so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Feed a visibility ratio for the region containing the viewer.
    ///
    /// Returns `None` unless this observation fired the trigger, in which
    /// case the document is loaded and first rendered before returning.
    pub async fn notify_visibility(&self, ratio: f32) -> Option<ViewerResult<RenderOutcome>> {
        let fired = self.trigger.borrow_mut().observe(ratio);
        if !fired {
            return None;
        }
        info!("Viewer region {:.0}% visible, loading document", ratio * 100.0);
        Some(self.load().await)
    }

    /// Open the document and perform the first render pass.
    ///
    /// Failures are logged and turned into the error indicator; the error is
    /// also returned for callers that care.
    pub async fn load(&self) -> ViewerResult<RenderOutcome> {
        if self.load_started.replace(true) {
            warn!("Document load already started, ignoring");
            return Ok(RenderOutcome::Skipped);
        }

        let result = match self.open_document().await {
            Ok(()) => self.render_all().await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            error!("Failed to load document: {e}");
            let message = self.config.validate_source.then(|| e.user_message());
            self.panel.borrow_mut().show_error(message);
        }
        result
    }

    async fn open_document(&self) -> ViewerResult<()> {
        if !self.engine.is_ready() {
            return Err(ViewerError::EngineUnavailable);
        }

        let location = self.config.location.resolve(&self.config.host_path);
        info!("Loading document from {location}");

        let fetched = self.source.fetch(&location).await?;
        let bytes = if self.config.validate_source {
            source::validate(fetched)?
        } else if fetched.is_success() {
            fetched.bytes
        } else {
            return Err(ViewerError::SourceUnreachable {
                location: fetched.location,
                status: fetched.status,
            });
        };

        let doc = self.engine.open(bytes, &self.config.open_options).await?;
        info!("Opened document with {} pages", doc.page_count());

        *self.document.borrow_mut() = Some(Rc::from(doc));
        self.panel
            .borrow_mut()
            .show_ready(self.zoom.get().label());
        Ok(())
    }

    /// Replace the container contents with one surface per page at the
    /// current scale.
    ///
    /// Pages are processed strictly in order, each painted before the next
    /// is fetched. A failure leaves already appended pages in place.
    pub async fn render_all(&self) -> ViewerResult<RenderOutcome> {
        let Some(doc) = self.document.borrow().clone() else {
            return Ok(RenderOutcome::Skipped);
        };

        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let scale = self.zoom.get().factor();

        let removed = self.panel.borrow_mut().container.clear_viewer_pages();
        debug!("Render pass {generation} at scale {scale}: cleared {removed} surfaces");

        let page_count = doc.page_count();
        for number in 1..=page_count {
            match self.render_page(doc.as_ref(), number, scale).await {
                Ok(surface) => {
                    if !self.is_current(generation) {
                        return Ok(self.superseded(generation, number - 1));
                    }
                    self.panel.borrow_mut().container.append(surface);
                }
                Err(_) if !self.is_current(generation) => {
                    return Ok(self.superseded(generation, number - 1));
                }
                Err(e) => return Err(e),
            }
        }

        debug!("Render pass {generation} completed {page_count} pages");
        Ok(RenderOutcome::Completed { pages: page_count })
    }

    async fn render_page(
        &self,
        doc: &dyn DocumentHandle,
        number: usize,
        scale: f32,
    ) -> ViewerResult<PageSurface> {
        let page = doc.page(number).await?;
        let viewport = page.viewport(scale);
        let mut surface =
            PageSurface::for_geometry(page.number(), viewport.width, viewport.height);
        page.render(&mut surface, &viewport).await?;
        Ok(surface)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    fn superseded(&self, generation: u64, committed: usize) -> RenderOutcome {
        debug!(
            "Render pass {generation} superseded by {} after {committed} pages",
            self.generation.get()
        );
        RenderOutcome::Superseded { committed }
    }

    /// Step the scale up and re-render; ignored without a document
    pub async fn zoom_in(&self) -> ViewerResult<RenderOutcome> {
        self.zoom_with(Zoom::step_in).await
    }

    /// Step the scale down and re-render; ignored without a document
    pub async fn zoom_out(&self) -> ViewerResult<RenderOutcome> {
        self.zoom_with(Zoom::step_out).await
    }

    async fn zoom_with(&self, step: fn(&mut Zoom)) -> ViewerResult<RenderOutcome> {
        if !self.is_loaded() {
            debug!("Zoom requested with no document loaded, ignoring");
            return Ok(RenderOutcome::Skipped);
        }

        let mut zoom = self.zoom.get();
        step(&mut zoom);
        self.zoom.set(zoom);
        self.panel.borrow_mut().set_zoom_label(zoom.label());

        let result = self.render_all().await;
        match &result {
            Ok(RenderOutcome::Completed { .. }) => self.panel.borrow_mut().clear_error(),
            Ok(_) => {}
            Err(e) => {
                error!("Re-render at scale {} failed: {e}", zoom.factor());
                self.panel.borrow_mut().show_error(Some(e.user_message()));
            }
        }
        result
    }
}
