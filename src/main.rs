use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use terra_globe::app::App;
use terra_globe::book::ndvi;
use terra_globe::capability::Capabilities;
use terra_globe::config::{Cli, Command, ViewArgs};
use terra_globe::contact::{self, ContactConfig};
use terra_globe::{data, ui};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command() {
        Command::Serve => {
            init_stderr_logging();
            let config = ContactConfig::from_env()?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting tokio runtime")?;
            runtime.block_on(contact::serve(config))
        }
        Command::Ndvi { input } => {
            init_stderr_logging();
            print_ndvi_book(&input)
        }
        command => run_terminal(&cli.view, &command),
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .init();
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_file_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn print_ndvi_book(input: &Path) -> Result<()> {
    let mut bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let master: serde_json::Value =
        simd_json::serde::from_slice(&mut bytes).context("parsing NDVI data")?;
    let book = ndvi::build_book(&master);
    info!(countries = book.countries.len(), "built NDVI storybook");
    println!("{}", serde_json::to_string_pretty(&book)?);
    Ok(())
}

/// Globe, book and game all run the terminal UI; the latter two open
/// their panel straight away.
fn run_terminal(view: &ViewArgs, command: &Command) -> Result<()> {
    init_file_logging(&view.log_file)?;

    // Detect capabilities before the terminal switches to raw mode
    let caps = Capabilities::detect(!view.no_narration);
    let coastlines = data::load_coastlines(&view.data_dir);
    info!(source = %coastlines.source, lines = coastlines.lines.len(), "coastlines ready");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let mut app = App::new(view, coastlines, caps, Instant::now());
    match command {
        Command::Book { code } => app.open_book(code, Instant::now()),
        Command::Game => app.open_explorer(),
        _ => {}
    }

    // Run the app
    let result = run(&mut terminal, &mut app);

    // Tear the globe down before handing the terminal back
    app.layer.unmount();

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    // Main loop
    loop {
        // Draw
        let now = Instant::now();
        terminal.draw(|frame| ui::render(frame, app, now))?;
        app.palette.on_frame_drawn();

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now());
                }
                Event::Mouse(mouse) => {
                    app.handle_mouse(mouse, Instant::now());
                }
                Event::Resize(width, height) => {
                    app.resize(width, height);
                }
                _ => {}
            }
        }

        // Advance animations and collect background results
        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
