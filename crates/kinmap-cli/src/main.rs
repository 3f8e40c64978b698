//! `kinmap`: map the people in your life and how they relate.
//!
//! # Usage
//!
//! ```text
//! kinmap onboard "Ada Lovelace"
//! kinmap person add --name "Charles Babbage" --primary Professional/Work
//! kinmap link Ada "Charles Babbage" --type Professional/Work
//! kinmap                      # interactive graph
//! ```

mod app;
mod commands;
mod settings;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use commands::Command;
use crossterm::{
  event::{self, DisableMouseCapture, EnableMouseCapture, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kinmap_core::{boundary::Boundary, engine::GraphEngine};
use kinmap_store_sqlite::SqliteStore;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kinmap", version, about = "Personal relationship map")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "kinmap.toml")]
  config: PathBuf,

  /// SQLite database file. Overrides `db_path` from config and environment.
  #[arg(long, value_name = "FILE")]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let settings = Settings::load(&args.config, args.db.as_deref())?;

  // The TUI owns the screen, so it only logs to a file.
  match &args.command {
    Some(_) => init_tracing(Some(io::stderr), true),
    None => match &settings.log_file {
      Some(path) => init_tracing(Some(log_writer(path)?), false),
      None => init_tracing(None::<fn() -> io::Stderr>, false),
    },
  }

  if let Some(parent) = settings.db_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&settings.db_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.db_path))?;
  tracing::debug!(path = %settings.db_path.display(), "opened store");

  let boundary = Boundary::new(GraphEngine::new(store));

  match args.command {
    Some(command) => {
      commands::run(command, &boundary, &settings, &mut io::stdout()).await?;
      let store = boundary.into_engine().into_store();
      store.close().await.context("closing store")
    }
    None => run_tui(boundary, &settings).await,
  }
}

// ─── Tracing ──────────────────────────────────────────────────────────────────

fn init_tracing<W>(writer: Option<W>, ansi: bool)
where
  W: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Send + Sync + 'static,
{
  let Some(writer) = writer else { return };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(writer)
    .with_ansi(ansi)
    .init();
}

fn log_writer(path: &Path) -> Result<Mutex<std::fs::File>> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  Ok(Mutex::new(file))
}

// ─── Terminal UI ──────────────────────────────────────────────────────────────

async fn run_tui(boundary: Boundary<SqliteStore>, settings: &Settings) -> Result<()> {
  let mut app = App::new(boundary, settings.forces);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
    .context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = match app.reload().await {
    Ok(()) => run_event_loop(&mut terminal, &mut app).await,
    Err(e) => Err(e),
  };

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
  terminal.show_cursor().ok();

  let store = app.boundary.into_engine().into_store();
  store.close().await.context("closing store")?;
  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<SqliteStore>,
) -> Result<()> {
  loop {
    let size = terminal.size().context("reading terminal size")?;
    app.graph_area = ui::graph_inner(Rect::new(0, 0, size.width, size.height));

    if app.is_animating() {
      app.tick();
    }
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll briefly while the layout moves, lazily once it rests.
    let wait = if app.is_animating() {
      Duration::from_millis(16)
    } else {
      Duration::from_millis(250)
    };
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(wait)? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      Some(Event::Mouse(mouse)) => app.handle_mouse(mouse),
      // Resize and focus changes redraw on the next iteration.
      _ => {}
    }
  }

  Ok(())
}
