mod commands;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use quicknotes_core::storage::{Database, KeyValueStore, MemoryStorage, NoteStore};
use quicknotes_tui::config::{load_config, Config};
use quicknotes_tui::{App, EventHandler};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

use crate::commands::Command;

/// Local note-taking in the terminal
#[derive(Parser, Debug)]
#[command(name = "quicknotes")]
#[command(about = "Capture your thoughts, organize your ideas")]
struct Args {
    /// Storage file holding the notes
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Config file (defaults to config.toml next to the storage file)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep notes in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let data_path = args.data.clone().unwrap_or_else(default_data_path);
    let interactive = args.command.is_none();
    let log_path = sibling(&data_path, "quicknotes.log");
    setup_tracing(args.verbose, interactive.then_some(log_path.as_path()));

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None if args.ephemeral => Config::default(),
        None => load_config(&sibling(&data_path, "config.toml")).unwrap_or_else(|err| {
            warn!(error = %err, "Falling back to default config");
            Config::default()
        }),
    };

    let storage: Box<dyn KeyValueStore> = if args.ephemeral {
        Box::new(MemoryStorage::new())
    } else {
        let db = Database::new(&data_path);
        info!(path = %db.path().display(), "Opening note storage");
        Box::new(db.open_storage()?)
    };

    match args.command {
        Some(command) => {
            let mut store = NoteStore::open(storage, config.storage.storage_key.clone())?;
            commands::run(command, &mut store, &mut io::stdout().lock())
        }
        None => run_tui(storage, config),
    }
}

fn default_data_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("quicknotes").join("quicknotes.db"))
        .unwrap_or_else(|| PathBuf::from("quicknotes.db"))
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    path.parent()
        .map(|p| p.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// While the TUI owns the terminal, logs go to a file instead of stderr.
/// If that file cannot be opened the logs are dropped rather than drawn over the UI.
fn setup_tracing(verbose: bool, log_path: Option<&Path>) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "quicknotes=debug,quicknotes_core=debug,quicknotes_tui=debug"
    } else if log_path.is_some() {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Some(path) = log_path {
        match open_log_file(path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry().with(filter).with(file_layer).init();
            }
            Err(err) => {
                eprintln!("Logging disabled, cannot open {}: {}", path.display(), err);
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
                    .init();
            }
        }
        return;
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn run_tui(storage: Box<dyn KeyValueStore>, config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    // Needed for Shift+Enter to be distinguishable from Enter
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(config.ui.tick_rate_ms);
    let mut app = App::new(storage, config);

    // Main loop
    let result = run_app(&mut terminal, &mut app, &event_handler);

    // Restore terminal
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(error = ?err, "Terminal UI exited with an error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_handler: &EventHandler,
) -> Result<()> {
    // First frame shows the loading placeholder, then the collection is read
    terminal.draw(|f| quicknotes_tui::ui::render(f, app))?;
    app.load();

    loop {
        // Draw UI
        terminal.draw(|f| quicknotes_tui::ui::render(f, app))?;

        // Handle events
        match event_handler.next()? {
            quicknotes_tui::Event::Key(key) => {
                quicknotes_tui::event::handle_key_event(key, app);
            }
            quicknotes_tui::Event::Mouse(mouse) => {
                quicknotes_tui::event::handle_mouse_event(mouse, app);
            }
            quicknotes_tui::Event::Tick => {
                app.tick();
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}
