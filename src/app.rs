//! Terminal host page
//!
//! A scrollable page with an intro followed by the "work" section that
//! embeds the viewer. The viewer stays dormant until enough of the work
//! section scrolls into view.

use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use log::{debug, error};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::EventSource;
use crate::viewer::{TriggerState, ViewerPanel, ViewerSession};

/// Lines occupied by the intro section
pub const INTRO_HEIGHT: u16 = 32;
/// Lines occupied by the work section that holds the viewer
pub const WORK_SECTION_HEIGHT: u16 = 40;

const INTRO_TEXT: &[&str] = &[
    "",
    "  Selected Work",
    "",
    "  Drawings, layouts and case studies collected into one document.",
    "  Scroll down to the work section to open it.",
    "",
    "  j/k or arrows  scroll      space/b  page down/up",
    "  +/-            zoom        q        quit",
];

const HELP_TEXT: &str = "j/k: Scroll | Space/b: Page | g/G: Top/Bottom | +/-: Zoom | q: Quit";

const TICK_RATE: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Fraction of a section `[start, start + len)` inside the window
/// `[scroll, scroll + viewport)`.
#[must_use]
pub fn visible_ratio(start: u16, len: u16, scroll: u16, viewport: u16) -> f32 {
    if len == 0 {
        return 0.0;
    }
    let top = u32::from(scroll).max(u32::from(start));
    let bottom = (u32::from(scroll) + u32::from(viewport)).min(u32::from(start) + u32::from(len));
    f32::from(u16::try_from(bottom.saturating_sub(top)).unwrap_or(u16::MAX)) / f32::from(len)
}

pub struct App {
    session: Rc<ViewerSession>,
    pool: LocalPool,
    scroll: u16,
    viewport_height: u16,
    last_ratio: Option<f32>,
}

impl App {
    #[must_use]
    pub fn new(session: Rc<ViewerSession>) -> Self {
        Self {
            session,
            pool: LocalPool::new(),
            scroll: 0,
            viewport_height: 0,
            last_ratio: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Rc<ViewerSession> {
        &self.session
    }

    #[must_use]
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn set_viewport_height(&mut self, height: u16) {
        self.viewport_height = height;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn page_height() -> u16 {
        INTRO_HEIGHT + WORK_SECTION_HEIGHT
    }

    fn max_scroll(&self) -> u16 {
        Self::page_height().saturating_sub(self.viewport_height)
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(self.max_scroll()));
        self.scroll = u16::try_from(next).unwrap_or(0);
    }

    /// Visible fraction of the work section
    #[must_use]
    pub fn work_visibility(&self) -> f32 {
        visible_ratio(
            INTRO_HEIGHT,
            WORK_SECTION_HEIGHT,
            self.scroll,
            self.viewport_height,
        )
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let half_page = i32::from((self.viewport_height / 2).max(1));

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::Char(' ') | KeyCode::PageDown => self.scroll_by(half_page),
            KeyCode::Char('b') | KeyCode::PageUp => self.scroll_by(-half_page),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let session = Rc::clone(&self.session);
                self.spawn(async move {
                    let _ = session.zoom_in().await;
                });
            }
            KeyCode::Char('-') => {
                let session = Rc::clone(&self.session);
                self.spawn(async move {
                    let _ = session.zoom_out().await;
                });
            }
            _ => {}
        }
        None
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + 'static) {
        if let Err(e) = self.pool.spawner().spawn_local(task) {
            error!("Failed to spawn viewer task: {e}");
        }
    }

    /// Report visibility changes and let pending viewer work make progress
    pub fn tick(&mut self) {
        if self.session.trigger_state() == TriggerState::Armed {
            let ratio = self.work_visibility();
            if self.last_ratio != Some(ratio) {
                self.last_ratio = Some(ratio);
                debug!("Work section visibility {ratio:.2}");
                let session = Rc::clone(&self.session);
                self.spawn(async move {
                    let _ = session.notify_visibility(ratio).await;
                });
            }
        }
        self.pool.run_until_stalled();
    }

    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        let mut lines: Vec<Line> = INTRO_TEXT.iter().map(|l| Line::from(*l)).collect();
        lines.resize(usize::from(INTRO_HEIGHT), Line::default());

        let mut work = self.work_lines();
        work.resize(usize::from(WORK_SECTION_HEIGHT), Line::default());
        lines.extend(work);

        let page = Paragraph::new(lines)
            .block(Block::default().borders(Borders::LEFT | Borders::RIGHT))
            .scroll((self.scroll, 0));
        f.render_widget(page, chunks[0]);

        let help = Paragraph::new(HELP_TEXT).style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[1]);
    }

    fn work_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            "  ── Work ──",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::default());
        lines.extend(viewer_lines(&self.session.panel()));
        lines
    }
}

/// Text rendition of the viewer region
#[must_use]
pub fn viewer_lines(panel: &ViewerPanel) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if panel.loading_visible {
        lines.push(Line::from("  Loading portfolio…"));
    }
    if panel.error_visible {
        lines.push(Line::from(Span::styled(
            "  Could not display the document.",
            Style::default().fg(Color::Red),
        )));
        if let Some(message) = &panel.error_message {
            lines.push(Line::from(format!("  {message}")));
        }
    }
    if panel.zoom_label_visible {
        lines.push(Line::from(format!("  [-] {} [+]", panel.zoom_label)));
        lines.push(Line::default());
    }
    for surface in panel.container.viewer_pages() {
        lines.push(Line::from(format!(
            "  Page {:>3}  {} x {} px",
            surface.page, surface.width, surface.height
        )));
    }
    lines
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        let size = terminal.size()?;
        app.set_viewport_height(size.height.saturating_sub(1));
        app.tick();
        terminal.draw(|f| app.draw(f))?;

        if event_source.poll(TICK_RATE)? {
            if let Event::Key(key) = event_source.read()? {
                if app.handle_key(key) == Some(AppAction::Quit) {
                    return Ok(());
                }
            }
        }
    }
}
