use folio::test_utils::test_helpers::{
    FakeEngine, LETTER, MemorySource, host_prefixed_config, page_shade, session_with,
};
use folio::viewer::{
    RenderOutcome, SessionConfig, TriggerState, ViewerError, ViewerSession, Zoom,
};
use futures::executor::block_on;

fn surface_sizes(session: &ViewerSession) -> Vec<(usize, u32, u32)> {
    session
        .panel()
        .container
        .viewer_pages()
        .map(|s| (s.page, s.width, s.height))
        .collect()
}

#[test]
fn three_page_document_renders_then_zooms_in() {
    let engine = FakeEngine::with_pages(3);
    let log = engine.log();
    let session = session_with(engine);

    let outcome = block_on(session.notify_visibility(0.5)).expect("trigger should fire");
    assert_eq!(outcome, Ok(RenderOutcome::Completed { pages: 3 }));

    {
        let panel = session.panel();
        assert!(!panel.loading_visible);
        assert!(!panel.error_visible);
        assert!(panel.zoom_label_visible);
        assert_eq!(panel.zoom_label, "100%");
    }
    assert_eq!(
        surface_sizes(&session),
        vec![(1, 612, 792), (2, 612, 792), (3, 612, 792)]
    );

    let outcome = block_on(session.zoom_in());
    assert_eq!(outcome, Ok(RenderOutcome::Completed { pages: 3 }));
    assert!((session.scale() - 1.1).abs() < 1e-6);
    assert_eq!(session.panel().zoom_label, "110%");
    assert_eq!(
        surface_sizes(&session),
        vec![(1, 673, 871), (2, 673, 871), (3, 673, 871)]
    );

    // Every page painted once per pass, in order
    let pages: Vec<usize> = log.paints.borrow().iter().map(|(p, _)| *p).collect();
    assert_eq!(pages, vec![1, 2, 3, 1, 2, 3]);
}

#[test]
fn surfaces_carry_painted_content_in_page_order() {
    let session = session_with(FakeEngine::with_pages(4));
    block_on(session.load()).unwrap();

    let panel = session.panel();
    for (index, surface) in panel.container.viewer_pages().enumerate() {
        assert_eq!(surface.page, index + 1);
        let shade = page_shade(surface.page);
        assert_eq!(surface.pixel(0, 0), Some([shade, shade, shade]));
    }
}

#[test]
fn fractional_geometry_is_truncated() {
    let session = session_with(FakeEngine::with_page_sizes(vec![(100.5, 200.7), LETTER]));
    block_on(session.load()).unwrap();
    assert_eq!(surface_sizes(&session), vec![(1, 100, 200), (2, 612, 792)]);
}

#[test]
fn unreachable_source_shows_error_without_surfaces() {
    let engine = FakeEngine::with_pages(3);
    let log = engine.log();
    let session = ViewerSession::new(
        Box::new(engine),
        Box::new(MemorySource::new(404, "text/html", b"<h1>Not Found</h1>")),
        SessionConfig::default(),
    );

    let outcome = block_on(session.notify_visibility(1.0)).unwrap();
    assert!(matches!(
        outcome,
        Err(ViewerError::SourceUnreachable { status: 404, .. })
    ));

    let panel = session.panel();
    assert!(panel.error_visible);
    assert!(!panel.loading_visible);
    assert!(panel.error_message.as_deref().unwrap().contains("404"));
    assert_eq!(panel.zoom_label, "100%");
    assert!(!panel.zoom_label_visible);
    assert_eq!(panel.container.viewer_page_count(), 0);
    assert_eq!(log.opens.get(), 0);
    assert!(!session.is_loaded());
}

#[test]
fn wrong_content_type_quotes_the_body() {
    let pointer = b"version https://git-lfs.github.com/spec/v1\noid sha256:4d7a\nsize 1234\n";
    let session = ViewerSession::new(
        Box::new(FakeEngine::with_pages(3)),
        Box::new(MemorySource::new(200, "text/plain", pointer)),
        SessionConfig::default(),
    );

    let outcome = block_on(session.load());
    assert!(matches!(outcome, Err(ViewerError::WrongContentType { .. })));

    let panel = session.panel();
    let message = panel.error_message.as_deref().unwrap();
    assert!(message.contains("version https://git-lfs.github.com/spec/v1"));
    assert!(!message.contains("HTTP"));
    assert_eq!(panel.container.viewer_page_count(), 0);
}

#[test]
fn without_validation_the_content_type_is_not_checked() {
    let config = SessionConfig {
        validate_source: false,
        ..SessionConfig::default()
    };
    let session = ViewerSession::new(
        Box::new(FakeEngine::with_pages(2)),
        Box::new(MemorySource::new(200, "text/plain", b"whatever")),
        config,
    );

    assert_eq!(
        block_on(session.load()),
        Ok(RenderOutcome::Completed { pages: 2 })
    );
}

#[test]
fn without_validation_errors_carry_no_message() {
    let config = SessionConfig {
        validate_source: false,
        ..SessionConfig::default()
    };
    let session = ViewerSession::new(
        Box::new(FakeEngine::with_pages(2)),
        Box::new(MemorySource::new(500, "text/plain", b"")),
        config,
    );

    assert!(block_on(session.load()).is_err());
    let panel = session.panel();
    assert!(panel.error_visible);
    assert_eq!(panel.error_message, None);
}

#[test]
fn decode_failure_shows_error() {
    let session = session_with(FakeEngine::with_pages(2).rejecting("bad xref"));
    let outcome = block_on(session.load());
    assert_eq!(outcome, Err(ViewerError::Decode("bad xref".into())));
    assert!(session.panel().error_visible);
    assert!(!session.is_loaded());
}

#[test]
fn unready_engine_is_a_precondition_failure() {
    let session = session_with(FakeEngine::with_pages(2).unready());
    assert_eq!(block_on(session.load()), Err(ViewerError::EngineUnavailable));
    let panel = session.panel();
    assert!(panel.error_visible);
    assert!(!panel.loading_visible);
}

#[test]
fn page_failure_keeps_earlier_pages() {
    let session = session_with(FakeEngine::with_pages(3).failing_page(2));
    let outcome = block_on(session.load());
    assert!(matches!(
        outcome,
        Err(ViewerError::PageRender { page: 2, .. })
    ));

    assert_eq!(surface_sizes(&session), vec![(1, 612, 792)]);
    assert!(session.panel().error_visible);
    // The document itself opened fine
    assert!(session.is_loaded());
}

#[test]
fn successful_zoom_clears_an_earlier_render_error() {
    let session = session_with(FakeEngine::with_pages(2).failing_page_on_pass(1, 2));
    block_on(session.load()).unwrap();

    let outcome = block_on(session.zoom_in());
    assert!(matches!(
        outcome,
        Err(ViewerError::PageRender { page: 1, .. })
    ));
    {
        let panel = session.panel();
        assert!(panel.error_visible);
        assert_eq!(
            panel.error_message.as_deref(),
            Some("Page 1 could not be rendered.")
        );
    }
    assert!(surface_sizes(&session).is_empty());

    let outcome = block_on(session.zoom_in());
    assert_eq!(outcome, Ok(RenderOutcome::Completed { pages: 2 }));
    let panel = session.panel();
    assert!(!panel.error_visible);
    assert_eq!(panel.error_message, None);
    assert_eq!(panel.zoom_label, "120%");
    assert_eq!(panel.container.viewer_page_count(), 2);
}

#[test]
fn zoom_without_document_does_nothing() {
    let engine = FakeEngine::with_pages(3);
    let log = engine.log();
    let session = session_with(engine);

    assert_eq!(block_on(session.zoom_in()), Ok(RenderOutcome::Skipped));
    assert_eq!(block_on(session.zoom_out()), Ok(RenderOutcome::Skipped));

    assert_eq!(session.scale(), 1.0);
    assert_eq!(session.generation(), 0);
    assert!(log.paints.borrow().is_empty());
    let panel = session.panel();
    assert_eq!(panel.zoom_label, "100%");
    assert!(!panel.error_visible);
    assert!(panel.loading_visible);
}

#[test]
fn zoom_clamps_at_both_bounds() {
    let session = session_with(FakeEngine::with_pages(1).without_yields());
    block_on(session.load()).unwrap();

    for _ in 0..20 {
        block_on(session.zoom_in()).unwrap();
    }
    assert_eq!(session.scale(), Zoom::MAX_SCALE);
    assert_eq!(session.panel().zoom_label, "200%");
    assert_eq!(surface_sizes(&session), vec![(1, 1224, 1584)]);

    for _ in 0..20 {
        block_on(session.zoom_out()).unwrap();
    }
    assert_eq!(session.scale(), Zoom::MIN_SCALE);
    assert_eq!(session.panel().zoom_label, "70%");
}

#[test]
fn visibility_below_threshold_does_not_load() {
    let engine = FakeEngine::with_pages(1);
    let log = engine.log();
    let session = session_with(engine);

    assert!(block_on(session.notify_visibility(0.0)).is_none());
    assert!(block_on(session.notify_visibility(0.1)).is_none());
    assert_eq!(session.trigger_state(), TriggerState::Armed);
    assert_eq!(log.opens.get(), 0);
}

#[test]
fn second_visibility_event_does_not_reload() {
    let engine = FakeEngine::with_pages(2);
    let log = engine.log();
    let source = MemorySource::pdf();
    let requests = source.requests();
    let session = ViewerSession::new(Box::new(engine), Box::new(source), SessionConfig::default());

    assert!(block_on(session.notify_visibility(0.2)).is_some());
    assert_eq!(session.trigger_state(), TriggerState::Fired);
    assert!(block_on(session.notify_visibility(0.9)).is_none());
    assert!(block_on(session.notify_visibility(1.0)).is_none());

    assert_eq!(log.opens.get(), 1);
    assert_eq!(requests.borrow().len(), 1);
}

#[test]
fn explicit_second_load_is_skipped() {
    let engine = FakeEngine::with_pages(2);
    let log = engine.log();
    let session = session_with(engine);

    block_on(session.load()).unwrap();
    assert_eq!(block_on(session.load()), Ok(RenderOutcome::Skipped));
    assert_eq!(log.opens.get(), 1);
}

#[test]
fn host_prefixed_location_uses_first_segment() {
    let source = MemorySource::pdf();
    let requests = source.requests();
    let session = ViewerSession::new(
        Box::new(FakeEngine::with_pages(1)),
        Box::new(source),
        host_prefixed_config("/portfolio-site/index.html"),
    );

    block_on(session.load()).unwrap();
    assert_eq!(
        requests.borrow().as_slice(),
        ["/portfolio-site/assets/portfolio.pdf".to_string()]
    );
}

#[test]
fn empty_document_renders_nothing() {
    let session = session_with(FakeEngine::with_pages(0));
    assert_eq!(
        block_on(session.load()),
        Ok(RenderOutcome::Completed { pages: 0 })
    );
    assert_eq!(session.panel().container.viewer_page_count(), 0);
    assert!(session.panel().zoom_label_visible);
}

#[test]
fn overlapping_zooms_keep_only_the_latest_pass() {
    let engine = FakeEngine::with_pages(3);
    let log = engine.log();
    let session = session_with(engine);
    block_on(session.load()).unwrap();

    let (first, second) = block_on(async { futures::join!(session.zoom_in(), session.zoom_in()) });

    assert_eq!(first, Ok(RenderOutcome::Superseded { committed: 0 }));
    assert_eq!(second, Ok(RenderOutcome::Completed { pages: 3 }));
    assert!((session.scale() - 1.2).abs() < 1e-6);
    assert_eq!(session.panel().zoom_label, "120%");
    assert_eq!(
        surface_sizes(&session),
        vec![(1, 734, 950), (2, 734, 950), (3, 734, 950)]
    );

    // The superseded pass stopped after its first page
    let stale_paints = log
        .paints
        .borrow()
        .iter()
        .filter(|(_, scale)| (*scale - 1.1).abs() < 1e-6)
        .count();
    assert_eq!(stale_paints, 1);
}

#[test]
fn render_started_mid_pass_replaces_partial_output() {
    let session = session_with(FakeEngine::with_pages(3));
    block_on(session.load()).unwrap();

    let (first, second) =
        block_on(async { futures::join!(session.render_all(), session.render_all()) });
    assert!(matches!(first, Ok(RenderOutcome::Superseded { .. })));
    assert_eq!(second, Ok(RenderOutcome::Completed { pages: 3 }));
    assert_eq!(session.panel().container.viewer_page_count(), 3);
}
