use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use folio::app::{App, run_app_with_event_source};
use folio::event_source::TerminalEventSource;
use folio::panic_handler;
use folio::settings::{self, Settings};
use folio::viewer::{FileSource, MupdfEngine, ViewerSession};

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Lazily loaded, zoomable PDF viewer")]
struct Args {
    /// Document location relative to the site root (overrides the config file)
    document: Option<String>,

    /// Directory the host page and its assets are served from
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path the host page is served from, e.g. `/my-site/index.html`
    #[arg(long, default_value = "/")]
    host_path: String,

    /// Prefix the document location with the first segment of --host-path
    #[arg(long)]
    host_prefixed: bool,

    /// Skip the status and content type check before decoding
    #[arg(long)]
    no_validate: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[arg(long, default_value = "folio.log")]
    log_file: PathBuf,
}

fn resolve_settings(args: &Args) -> Settings {
    let mut settings = match &args.config {
        Some(path) => settings::load_or_create(path),
        None => settings::load_settings(),
    };
    if let Some(document) = &args.document {
        settings.document = document.clone();
    }
    settings.host_prefixed |= args.host_prefixed;
    if args.no_validate {
        settings.validate_source = false;
    }
    settings
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("creating log file {:?}", args.log_file))?,
    )?;
    panic_handler::initialize_panic_handler();

    info!("Starting folio");
    let settings = resolve_settings(&args);

    let engine = MupdfEngine::spawn();
    let source = FileSource::new(&args.root);
    let session = ViewerSession::new(
        Box::new(engine),
        Box::new(source),
        settings.session_config(&args.host_path),
    );
    let mut app = App::new(session);

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut TerminalEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down folio");
    Ok(())
}
