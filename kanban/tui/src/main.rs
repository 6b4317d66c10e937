use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use kanban::app::App;
use kanban::auth::{AuthOutcome, spawn_auth};
use kanban::settings::{self, Settings};
use kanban::{telemetry, ui};
use kanban_core::{CredentialStore, KvStore, TaskStore};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{info, warn};

const TICK: Duration = Duration::from_millis(80);

/// A personal kanban board in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Directory holding the database, log file and config file
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Config file to read instead of `<data-dir>/config.toml`
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_required = cli.config.is_some();
    let config_file = settings::config_file_path(
        cli.config.clone(),
        cli.data_dir.as_deref(),
        std::env::var_os(settings::DATA_DIR_ENV).map(PathBuf::from),
    );
    let settings = Settings::load(&config_file, config_required)
        .with_context(|| format!("failed to load settings from {}", config_file.display()))?;
    let data_dir = settings.resolve_data_dir(cli.data_dir);

    let _guard = telemetry::init_logging(&data_dir, &settings.log_filter)
        .context("failed to set up logging")?;
    info!(data_dir = %data_dir.display(), persist_mode = ?settings.persist_mode, "starting");
    if settings::is_fallback_data_dir(&data_dir) {
        warn!("could not determine home directory, using {}", data_dir.display());
    }

    let kv = KvStore::open(&data_dir)
        .with_context(|| format!("failed to open database in {}", data_dir.display()))?;
    let credentials = CredentialStore::with_cost(kv.clone(), settings.bcrypt_cost);
    let app = App::new(TaskStore::new(kv), settings.persist_mode);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, app, credentials).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    credentials: CredentialStore,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AuthOutcome>();

    while !app.should_quit() {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(request) = app.on_key(key) {
                        spawn_auth(credentials.clone(), request, tx.clone());
                    }
                }
            }
        }

        while let Ok(outcome) = rx.try_recv() {
            app.on_auth_outcome(outcome);
        }
        app.on_tick();
    }

    Ok(())
}
