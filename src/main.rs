use alexandria_library::app::{self, events::UserEvent, state::AppState, view_model::LibraryRow};
use alexandria_library::config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "alexandria", version, about = "Browse, search and annotate a file library")]
struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true, env = "ALEXANDRIA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the library base path.
    #[arg(long, global = true)]
    base: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every library file below a directory.
    List { dir: Option<PathBuf> },
    /// Search file names and bibliography sidecars.
    Search {
        term: String,
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Copy a document into the library.
    Add { file: PathBuf, dir: Option<PathBuf> },
    /// Check a PDF for a text layer and record the `ocr` flag.
    Ocr { file: PathBuf },
    /// Show or replace the bibliography record of a file.
    Bib {
        file: PathBuf,
        #[arg(long)]
        set: Option<String>,
    },
    /// Open a file, or with `--dir` its folder, in the desktop's default app.
    Open {
        file: PathBuf,
        #[arg(long)]
        dir: bool,
    },
    /// Print the active configuration.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app_config = config::settings::load_config(cli.config.as_deref())?;
    if let Some(base) = &cli.base {
        app_config.base_path = base.clone();
    }
    app_config.ensure_library_root()?;

    let mut app_state = AppState::new(app_config);
    app_state.config_path = cli.config.clone();
    let state = Arc::new(Mutex::new(app_state));
    let (proxy, mut events) = mpsc::unbounded_channel::<UserEvent>();

    let generation = match cli.command {
        Command::Config => {
            let state_guard = state.lock().expect("Mutex was poisoned. This should not happen.");
            let path = cli
                .config
                .clone()
                .or_else(config::settings::get_config_file_path);
            if let Some(path) = path {
                eprintln!("# {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&state_guard.config)?);
            return Ok(());
        }
        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| default_directory(&state));
            app::commands::select_directory(dir, proxy.clone(), &state)
        }
        Command::Search { term, root } => {
            state
                .lock()
                .expect("Mutex was poisoned. This should not happen.")
                .selected_dir = root;
            app::commands::start_search(&term, proxy.clone(), &state)
        }
        Command::Add { file, dir } => {
            let added = app::commands::add_file(&file, dir, proxy.clone(), &state)?;
            eprintln!("Added {}", added.display());
            Some(current_generation(&state))
        }
        Command::Ocr { file } => {
            select_parent(&state, &file);
            let has_text = app::commands::check_ocr(&file, proxy.clone(), &state)?;
            eprintln!("ocr: {has_text}");
            Some(current_generation(&state))
        }
        Command::Bib { file, set: None } => {
            match app::commands::read_bib(&file)? {
                Some(text) => print!("{text}"),
                None => eprintln!("No bib record for {}", file.display()),
            }
            return Ok(());
        }
        Command::Bib {
            file,
            set: Some(text),
        } => {
            select_parent(&state, &file);
            if !app::commands::save_bib(&file, &text, proxy.clone(), &state)? {
                eprintln!("Empty record, nothing saved");
                return Ok(());
            }
            Some(current_generation(&state))
        }
        Command::Open { file, dir } => {
            if dir {
                app::commands::reveal_entry(&file)?;
            } else {
                app::commands::open_entry(&file)?;
            }
            return Ok(());
        }
    };

    let Some(generation) = generation else {
        drain_errors(&mut events);
        return Ok(());
    };

    run_event_loop(&mut events, &state, generation).await;

    let state_guard = state.lock().expect("Mutex was poisoned. This should not happen.");
    print_rows(&state_guard.rows)?;
    eprintln!("{}", state_guard.status_message);
    Ok(())
}

fn default_directory(state: &Arc<Mutex<AppState>>) -> PathBuf {
    let state_guard = state.lock().expect("Mutex was poisoned. This should not happen.");
    state_guard
        .config
        .last_directory
        .clone()
        .filter(|dir| dir.starts_with(&state_guard.config.base_path) && dir.is_dir())
        .unwrap_or_else(|| state_guard.config.base_path.clone())
}

fn select_parent(state: &Arc<Mutex<AppState>>, file: &std::path::Path) {
    if let Some(parent) = file.parent().filter(|p| p.is_dir()) {
        state
            .lock()
            .expect("Mutex was poisoned. This should not happen.")
            .selected_dir = Some(parent.to_path_buf());
    }
}

fn current_generation(state: &Arc<Mutex<AppState>>) -> u64 {
    state
        .lock()
        .expect("Mutex was poisoned. This should not happen.")
        .generation
}

fn drain_errors(events: &mut mpsc::UnboundedReceiver<UserEvent>) {
    while let Ok(event) = events.try_recv() {
        if let UserEvent::ShowError(message) = event {
            eprintln!("error: {message}");
        }
    }
}

/// Pumps worker events into the state until the given run has finished.
/// Ctrl-C cancels the run; its partial result is still shown.
async fn run_event_loop(
    events: &mut mpsc::UnboundedReceiver<UserEvent>,
    state: &Arc<Mutex<AppState>>,
    generation: u64,
) {
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                eprintln!("\nCancelling...");
                app::commands::cancel_scan(state);
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                let finished = matches!(
                    &event,
                    UserEvent::ScanFinished { generation: g, .. } if *g == generation
                );
                match &event {
                    UserEvent::ScanProgress { percent, .. } => {
                        eprint!("\r{percent:>3}%");
                    }
                    UserEvent::ShowError(message) => eprintln!("error: {message}"),
                    _ => {}
                }
                app::handle_user_event(state, event);
                if finished {
                    eprintln!();
                    break;
                }
            }
        }
    }
}

fn print_rows(rows: &[LibraryRow]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in rows {
        let bib = if row.has_bib { "bib" } else { "-" };
        let ocr = match row.ocr {
            Some(true) => "ocr",
            Some(false) => "no-ocr",
            None => "-",
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            row.file_name, row.directory, bib, ocr, row.media_type
        )?;
    }
    Ok(())
}
