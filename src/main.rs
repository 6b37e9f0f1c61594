use std::{
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    rc::Rc,
    sync::Mutex,
};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use coderacer::{
    app::App,
    app_dirs::AppDirs,
    clock::Clock,
    corpus::{language_name, Corpus, SnippetSource, ALL_LANGUAGES},
    game::Game,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    session::GameMode,
    storage::{KeyValueStore, MemoryStore, SqliteStore},
};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// race through real lines of code in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing practice for programmers: type real code line by line, with sprint and challenge modes, live WPM and accuracy, and a persisted session history."
)]
pub struct Cli {
    /// game mode to start in
    #[clap(short = 'm', long, value_enum, default_value_t = ModeArg::Free)]
    mode: ModeArg,

    /// snippet language to practice (`all` draws from every language)
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// draw every line from a random language
    #[clap(long)]
    mixed: bool,

    /// print the snippet languages and exit
    #[clap(long)]
    list_languages: bool,

    /// keep preferences and history in memory only
    #[clap(long)]
    ephemeral: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum ModeArg {
    Free,
    Sprint,
    Challenge,
    Browse,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Free => GameMode::Free,
            ModeArg::Sprint => GameMode::sprint(),
            ModeArg::Challenge => GameMode::challenge(),
            ModeArg::Browse => GameMode::Browse,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let corpus = Corpus::embedded();

    if cli.list_languages {
        print_languages(&corpus, &mut io::stdout().lock())?;
        return Ok(());
    }

    if let Some(language) = &cli.language {
        if !is_known_language(&corpus, language) {
            let mut cmd = Cli::command();
            cmd.error(
                ErrorKind::InvalidValue,
                format!("unknown language '{language}', see --list-languages"),
            )
            .exit();
        }
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = init_logging() {
        eprintln!("coderacer: logging disabled: {e:#}");
    }
    tracing::info!(mode = %cli.mode, ephemeral = cli.ephemeral, "starting");

    let mut game = Game::new(
        Rc::new(corpus),
        Box::new(rand::thread_rng()),
        Clock::System,
        open_store(cli.ephemeral),
        cli.mode.into(),
    );
    apply_overrides(&mut game, &cli);
    let mut app = App::new(game);

    enable_raw_mode().context("enabling raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("exiting");
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    while !app.should_quit {
        if app.handle_event(runner.step()) {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}

/// Log to a file in the state directory; stdout belongs to the TUI.
fn init_logging() -> anyhow::Result<()> {
    let path = AppDirs::log_path().context("no state directory")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coderacer=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;
    Ok(())
}

fn open_store(ephemeral: bool) -> Rc<dyn KeyValueStore> {
    if !ephemeral {
        match AppDirs::db_path().map(SqliteStore::open) {
            Some(Ok(store)) => return Rc::new(store),
            Some(Err(e)) => tracing::warn!(error = %e, "cannot open state db, nothing will be saved"),
            None => tracing::warn!("no state directory, nothing will be saved"),
        }
    }
    Rc::new(MemoryStore::new())
}

/// Command line choices win over stored preferences and are saved back.
fn apply_overrides(game: &mut Game, cli: &Cli) {
    if let Some(language) = &cli.language {
        game.set_language_preference(language);
    }
    if cli.mixed {
        game.set_mixed_language(true);
    }
}

fn is_known_language(corpus: &Corpus, language: &str) -> bool {
    language == ALL_LANGUAGES || corpus.blocks(language).is_some()
}

fn print_languages<W: Write>(corpus: &Corpus, out: &mut W) -> io::Result<()> {
    for language in corpus.languages() {
        let blocks = corpus.blocks(language).map_or(0, <[String]>::len);
        writeln!(
            out,
            "{:<12}{:<20}{} blocks",
            language,
            language_name(language),
            blocks
        )?;
    }
    Ok(())
}
