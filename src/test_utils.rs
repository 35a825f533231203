pub mod test_helpers {
    use std::cell::{Cell, RefCell};
    use std::future::Future;
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::{Context, Poll};

    use async_trait::async_trait;

    use crate::viewer::{
        DocumentEngine, DocumentHandle, DocumentSource, FetchedDocument, OpenOptions, PageHandle,
        PageSurface, SessionConfig, SourceLocation, Viewport, ViewerError, ViewerResult,
        ViewerSession,
    };

    /// US Letter in points
    pub const LETTER: (f32, f32) = (612.0, 792.0);

    /// Grey level the fake engine paints page `n` with
    pub fn page_shade(page: usize) -> u8 {
        (page * 40 % 256) as u8
    }

    /// Pending once, then ready: gives the executor a chance to run other tasks
    #[derive(Default)]
    pub struct YieldNow {
        yielded: bool,
    }

    impl Future for YieldNow {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                Poll::Ready(())
            } else {
                self.yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// What the fake engine was asked to do
    #[derive(Debug, Default)]
    pub struct EngineLog {
        pub opens: Cell<usize>,
        pub page_fetches: RefCell<Vec<usize>>,
        /// (page, scale) per paint
        pub paints: RefCell<Vec<(usize, f32)>>,
    }

    /// In-memory decoding engine with scripted pages and failures
    pub struct FakeEngine {
        pages: Vec<(f32, f32)>,
        ready: bool,
        decode_error: Option<String>,
        failing_page: Option<PageFailure>,
        yield_between_steps: bool,
        log: Rc<EngineLog>,
    }

    /// Which page fails to paint, and on which of its passes
    #[derive(Clone)]
    struct PageFailure {
        page: usize,
        /// Only this 1-based pass fails; every pass when `None`
        pass: Option<usize>,
        fetches: Rc<Cell<usize>>,
    }

    impl PageFailure {
        fn applies_to(&self, number: usize) -> bool {
            if number != self.page {
                return false;
            }
            let fetch = self.fetches.get() + 1;
            self.fetches.set(fetch);
            self.pass.is_none_or(|pass| pass == fetch)
        }
    }

    impl FakeEngine {
        /// `count` letter-sized pages
        pub fn with_pages(count: usize) -> Self {
            Self::with_page_sizes(vec![LETTER; count])
        }

        pub fn with_page_sizes(pages: Vec<(f32, f32)>) -> Self {
            Self {
                pages,
                ready: true,
                decode_error: None,
                failing_page: None,
                yield_between_steps: true,
                log: Rc::new(EngineLog::default()),
            }
        }

        /// Worker endpoint never configured
        pub fn unready(mut self) -> Self {
            self.ready = false;
            self
        }

        pub fn rejecting(mut self, reason: &str) -> Self {
            self.decode_error = Some(reason.to_string());
            self
        }

        /// Painting this page (1-based) fails
        pub fn failing_page(mut self, page: usize) -> Self {
            self.failing_page = Some(PageFailure {
                page,
                pass: None,
                fetches: Rc::new(Cell::new(0)),
            });
            self
        }

        /// Painting this page fails only during the given render pass (both 1-based)
        pub fn failing_page_on_pass(mut self, page: usize, pass: usize) -> Self {
            self.failing_page = Some(PageFailure {
                page,
                pass: Some(pass),
                fetches: Rc::new(Cell::new(0)),
            });
            self
        }

        /// Complete every step without suspending
        pub fn without_yields(mut self) -> Self {
            self.yield_between_steps = false;
            self
        }

        pub fn log(&self) -> Rc<EngineLog> {
            Rc::clone(&self.log)
        }
    }

    #[async_trait(?Send)]
    impl DocumentEngine for FakeEngine {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn open(
            &self,
            _bytes: Vec<u8>,
            _options: &OpenOptions,
        ) -> ViewerResult<Box<dyn DocumentHandle>> {
            self.log.opens.set(self.log.opens.get() + 1);
            if self.yield_between_steps {
                YieldNow::default().await;
            }
            if let Some(reason) = &self.decode_error {
                return Err(ViewerError::Decode(reason.clone()));
            }
            Ok(Box::new(FakeDocument {
                pages: self.pages.clone(),
                failing_page: self.failing_page.clone(),
                yield_between_steps: self.yield_between_steps,
                log: Rc::clone(&self.log),
            }))
        }
    }

    struct FakeDocument {
        pages: Vec<(f32, f32)>,
        failing_page: Option<PageFailure>,
        yield_between_steps: bool,
        log: Rc<EngineLog>,
    }

    #[async_trait(?Send)]
    impl DocumentHandle for FakeDocument {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        async fn page(&self, number: usize) -> ViewerResult<Box<dyn PageHandle>> {
            self.log.page_fetches.borrow_mut().push(number);
            if self.yield_between_steps {
                YieldNow::default().await;
            }
            let size = number
                .checked_sub(1)
                .and_then(|i| self.pages.get(i))
                .copied()
                .ok_or_else(|| ViewerError::page_render(number, "no such page"))?;
            Ok(Box::new(FakePage {
                number,
                size,
                fails: self
                    .failing_page
                    .as_ref()
                    .is_some_and(|failure| failure.applies_to(number)),
                yield_between_steps: self.yield_between_steps,
                log: Rc::clone(&self.log),
            }))
        }
    }

    struct FakePage {
        number: usize,
        size: (f32, f32),
        fails: bool,
        yield_between_steps: bool,
        log: Rc<EngineLog>,
    }

    #[async_trait(?Send)]
    impl PageHandle for FakePage {
        fn number(&self) -> usize {
            self.number
        }

        fn viewport(&self, scale: f32) -> Viewport {
            Viewport::from_page_size(self.number, self.size, scale)
        }

        async fn render(&self, surface: &mut PageSurface, viewport: &Viewport) -> ViewerResult<()> {
            let draw = viewport.draw;
            self.log.paints.borrow_mut().push((draw.page, draw.scale));
            if self.yield_between_steps {
                YieldNow::default().await;
            }
            if self.fails {
                return Err(ViewerError::page_render(self.number, "scripted failure"));
            }
            surface.pixels.fill(page_shade(self.number));
            Ok(())
        }
    }

    /// Source that always answers with the same response
    pub struct MemorySource {
        response: FetchedDocument,
        fetched: Rc<RefCell<Vec<String>>>,
    }

    impl MemorySource {
        pub fn new(status: u16, content_type: &str, bytes: &[u8]) -> Self {
            Self {
                response: FetchedDocument {
                    location: String::new(),
                    status,
                    content_type: content_type.to_string(),
                    bytes: bytes.to_vec(),
                },
                fetched: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// A well-formed PDF response
        pub fn pdf() -> Self {
            Self::new(200, "application/pdf", b"%PDF-1.7\n%fake")
        }

        /// Locations requested so far
        pub fn requests(&self) -> Rc<RefCell<Vec<String>>> {
            Rc::clone(&self.fetched)
        }
    }

    #[async_trait(?Send)]
    impl DocumentSource for MemorySource {
        async fn fetch(&self, location: &str) -> ViewerResult<FetchedDocument> {
            self.fetched.borrow_mut().push(location.to_string());
            Ok(FetchedDocument {
                location: location.to_string(),
                ..self.response.clone()
            })
        }
    }

    /// Session over a fake engine and a PDF-serving memory source
    pub fn session_with(engine: FakeEngine) -> Rc<ViewerSession> {
        ViewerSession::new(
            Box::new(engine),
            Box::new(MemorySource::pdf()),
            SessionConfig::default(),
        )
    }

    pub fn host_prefixed_config(host_path: &str) -> SessionConfig {
        SessionConfig {
            location: SourceLocation::HostPrefixed("./assets/portfolio.pdf".to_string()),
            host_path: host_path.to_string(),
            ..SessionConfig::default()
        }
    }
}
