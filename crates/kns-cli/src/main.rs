//! `kns`: terminal UI for browsing the group tree and notification drawer.
//!
//! # Usage
//!
//! ```
//! kns --url http://localhost:8080 --profile 3f2a… --group harbour-street
//! kns --config ~/.config/kns/config.toml
//! ```

mod app;
mod client;
mod ui;

use std::{io, sync::Mutex, time::Duration};

use anyhow::{Context, Result, anyhow};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kns", about = "Terminal UI for the Kingdom Nurturing Suite")]
struct Args {
  /// Path to a TOML config file (url, profile, group).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the KNS server (default: http://localhost:8080).
  #[arg(long, env = "KNS_URL")]
  url: Option<String>,

  /// Slug of the profile to act as.
  #[arg(long, env = "KNS_PROFILE")]
  profile: Option<String>,

  /// Slug of the group whose tree is shown (default: first root group).
  #[arg(long, env = "KNS_GROUP")]
  group: Option<String>,

  /// Append request logs to this file; the terminal is owned by the UI.
  #[arg(long, env = "KNS_LOG", value_name = "FILE")]
  log: Option<std::path::PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:     String,
  #[serde(default)]
  profile: String,
  #[serde(default)]
  group:   String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log {
    let file = std::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::DEBUG.into())
          .from_env_lossy(),
      )
      .with_writer(Mutex::new(file))
      .with_ansi(false)
      .init();
  }

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    profile:  args.profile.or_else(|| non_empty(&file_cfg.profile)).unwrap_or_default(),
  };
  let client = ApiClient::new(api_config)?;

  let root_slug = match args.group.or_else(|| non_empty(&file_cfg.group)) {
    Some(slug) => slug,
    None => client
      .list_groups()
      .await?
      .into_iter()
      .find(|g| g.is_root())
      .map(|g| g.slug)
      .ok_or_else(|| anyhow!("no groups registered yet"))?,
  };

  let mut app = App::new(client, root_slug);

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let load_result = app.load_tree().await;

  // Run the event loop; restore terminal even on error.
  let run_result = if load_result.is_ok() {
    app.load_drawer().await;
    run_event_loop(&mut terminal, &mut app).await
  } else {
    load_result
  };

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
