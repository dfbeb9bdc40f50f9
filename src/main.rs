//! testeate - Terminal Quiz Trainer
//!
//! A TUI for importing, configuring, and taking multiple-choice tests.
//!
//! Features:
//! - Import question banks from plain text files
//! - Configure the correct answer of every question
//! - Take tests in practice mode (instant feedback) or exam mode
//! - Review past results and statistics
//! - Dark and light themes
//!
//! Usage: testeate [--data-dir DIR] [import FILE | list | history]
//! Run `testeate --help` for keybindings and the question-bank format.

mod app;
mod config;
mod session;
mod storage;
mod types;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs::OpenOptions;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"KEYBINDINGS:
    1-3              Switch tabs (Tests, History, Settings)
    j/k              Navigate up/down
    Enter            Open / answer / confirm
    h/l              Change the correct answer (Test Details)
    p / e            Start practice / exam (Test Details)
    End              Finish the running test
    Esc              Back / abandon
    q                Quit

QUESTION BANK FORMAT:
    # Optional test title
    1. What does "perro" mean?
    a) Cat
    b) Dog
    Answer: b

CONFIG:
    ~/.config/testeate/config.toml"#;

#[derive(Debug, PartialEq, Eq, Parser)]
#[command(
    name = "testeate",
    version,
    about = "Terminal quiz trainer: import, configure, and take multiple-choice tests",
    after_help = AFTER_HELP
)]
struct Args {
    /// Store tests and results in DIR
    #[arg(short, long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    // No command starts the interactive app
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Import a question bank text file
    Import {
        /// Plain-text question bank
        file: PathBuf,

        /// Test name for questions before the first header (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Split every section into tests of at most N questions
        #[arg(long, value_name = "N", value_parser = parse_chunk)]
        chunk: Option<usize>,
    },

    /// List tests and their statistics
    List,

    /// Print past results
    History,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn parse_chunk(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(e) => Err(format!("invalid chunk size '{}': {}", value, e)),
    }
}

/// Send tracing output to a log file; the terminal belongs to the TUI
fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
    let log_path = data_dir.join("testeate.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("testeate=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn run(args: Args) -> Result<()> {
    let config_path = config::Config::path()?;
    let config = config::Config::load_from(&config_path)
        .context("Failed to load configuration")?;

    let data_dir = match args.data_dir.or_else(|| config.data_dir.clone()) {
        Some(dir) => dir,
        None => Storage::default_dir()?,
    };
    init_logging(&data_dir)?;

    let storage = Storage::open(&data_dir).context("Failed to open storage")?;
    info!(data_dir = %data_dir.display(), "storage opened");

    match args.command {
        Some(Command::Import { file, name, chunk }) => {
            import(&storage, &file, name.as_deref(), chunk)
        }
        Some(Command::List) => list(&storage),
        Some(Command::History) => history(&storage),
        None => run_app(storage, config, config_path),
    }
}

fn import(storage: &Storage, file: &Path, name: Option<&str>, chunk: Option<usize>) -> Result<()> {
    let tests = storage.import_file(file, name, chunk)?;
    for test in &tests {
        let status = if test.is_configured() {
            "ready".to_string()
        } else {
            format!("{}/{} answers set", test.configured_count(), test.questions.len())
        };
        println!("Imported \"{}\": {} questions ({})", test.name, test.questions.len(), status);
    }
    Ok(())
}

fn list(storage: &Storage) -> Result<()> {
    storage.initialize_default_tests()?;
    let tests = storage.get_tests()?;
    if tests.is_empty() {
        println!("No tests. Import one with: testeate import FILE");
        return Ok(());
    }

    println!("{:<36}  {:>9}  {:>8}  {:>5}  NAME", "ID", "QUESTIONS", "ATTEMPTS", "BEST");
    for test in tests {
        let stats = storage.calculate_test_stats(test.id)?;
        let marker = if storage::is_test_configured(&test) { "" } else { " (needs answers)" };
        println!(
            "{:<36}  {:>9}  {:>8}  {:>5}  {}{}",
            test.id,
            test.questions.len(),
            stats.attempts,
            stats.best_score_label(),
            test.name,
            marker,
        );
    }
    Ok(())
}

fn history(storage: &Storage) -> Result<()> {
    let results = storage.get_results()?;
    if results.is_empty() {
        println!("No results yet.");
        return Ok(());
    }

    println!("{}", storage.history_stats()?.summary());
    println!();
    for result in results {
        println!(
            "{}  {:>4}%  {:>3}/{:<3}  {:<8}  {:>7}  {}",
            result.formatted_date(),
            result.score,
            result.correct,
            result.total(),
            result.mode.as_str(),
            result.formatted_time(),
            result.test_name,
        );
    }
    Ok(())
}

fn run_app(storage: Storage, config: config::Config, config_path: PathBuf) -> Result<()> {
    let seeded = storage
        .initialize_default_tests()
        .context("Failed to seed default tests")?;
    if seeded > 0 {
        eprintln!("Added {} starter test(s)", seeded);
    }

    let mut app = App::new(storage, config, config_path);

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)
        .context("Failed to setup terminal")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)
        .context("Failed to create terminal")?;

    // Run main loop
    let result = main_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    info!("exiting");
    result
}

fn main_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::render(frame, app);
        })?;

        // Expire flash messages
        app.tick();

        // Poll with a timeout so the quiz clock keeps moving
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key)?;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("testeate").chain(list.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_defaults_to_tui() {
        let parsed = parse(&[]).unwrap();
        assert_eq!(parsed, Args { data_dir: None, command: None });
    }

    #[test]
    fn test_parse_import() {
        let parsed = parse(&[
            "--data-dir", "/tmp/t", "import", "bank.txt", "--name", "Verbs", "--chunk", "10",
        ])
        .unwrap();
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/t")));
        assert_eq!(
            parsed.command,
            Some(Command::Import {
                file: PathBuf::from("bank.txt"),
                name: Some("Verbs".into()),
                chunk: Some(10),
            })
        );
    }

    #[test]
    fn test_parse_data_dir_after_command() {
        let parsed = parse(&["history", "-d", "/tmp/t"]).unwrap();
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/t")));
        assert_eq!(parsed.command, Some(Command::History));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse(&["history"]).unwrap().command, Some(Command::History));
        assert_eq!(parse(&["list"]).unwrap().command, Some(Command::List));
        assert_eq!(
            parse(&["--help"]).unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
        assert_eq!(
            parse(&["--version"]).unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["import"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["import", "x.txt", "--chunk", "0"]).is_err());
        assert!(parse(&["import", "x.txt", "--chunk", "many"]).is_err());
        assert!(parse(&["list", "--name", "x"]).is_err());
        assert!(parse(&["--data-dir"]).is_err());
    }

    #[test]
    fn test_parse_chunk() {
        assert_eq!(parse_chunk("3"), Ok(3));
        assert!(parse_chunk("0").is_err());
        assert!(parse_chunk("-1").is_err());
    }
}
