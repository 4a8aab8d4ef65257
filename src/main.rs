use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use pinyin_drill::{
    app::{App, Control, DrillSettings},
    config::{Config, ConfigStore, FileConfigStore},
    deck::{DeckError, DeckSet},
    difficulty::ToneMode,
    history::{humanize_since, HistoryDb},
    logging,
    runtime::{DrillEvent, EventSource, Runner},
    ui::screen,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    time::Instant,
};

const MISSED_ROWS: usize = 5;

/// timed hanzi-to-pinyin flashcard drill in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type the pinyin for each prompt before the clock runs out. Three tiers (easy, medium, hard), with or without tone marks, and a local history of past sessions."
)]
pub struct Cli {
    /// difficulty tier: easy, medium or hard (anything else means easy)
    #[clap(short = 'd', long)]
    difficulty: Option<String>,

    /// accept answers without tone marks
    #[clap(short = 't', long, conflicts_with = "tones")]
    toneless: bool,

    /// require tone marks even if the saved settings say otherwise
    #[clap(long)]
    tones: bool,

    /// custom deck file with easy, medium and hard card lists
    #[clap(long, value_name = "PATH")]
    deck: Option<PathBuf>,

    /// print the last N finished sessions and exit
    #[clap(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    history: Option<usize>,

    /// write every finished session to a CSV file and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// delete every recorded session and exit
    #[clap(long)]
    clear_history: bool,

    /// do not record this run in the session history
    #[clap(long)]
    no_save: bool,
}

impl Cli {
    /// Layer command line choices over the saved config
    fn merge_into(&self, mut cfg: Config) -> Config {
        if let Some(d) = self.difficulty.as_ref() {
            cfg.difficulty = d.clone();
        }
        if self.toneless || self.tones {
            cfg.tone_mode = ToneMode::from_toneless_flag(self.toneless);
        }
        if let Some(deck) = self.deck.as_ref() {
            cfg.deck_file = Some(deck.clone());
        }
        cfg
    }

    fn to_settings(&self, cfg: &Config) -> DrillSettings {
        DrillSettings {
            difficulty: cfg.difficulty(),
            tone_mode: cfg.tone_mode,
            save_history: !self.no_save,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init();

    if let Some(limit) = cli.history {
        let db = HistoryDb::new()?;
        print_history(&db, limit, &mut io::stdout().lock())?;
        return Ok(());
    }

    if let Some(path) = cli.export.as_ref() {
        let db = HistoryDb::new()?;
        let written = db.export_csv_to_path(path)?;
        println!("exported {written} sessions to {}", path.display());
        return Ok(());
    }

    if cli.clear_history {
        let db = HistoryDb::new()?;
        let removed = db.clear_all()?;
        println!("removed {removed} sessions from history");
        return Ok(());
    }

    let store = FileConfigStore::new();
    let mut cfg = cli.merge_into(store.load());
    let decks = match resolve_decks(cli.deck.as_deref(), &mut cfg) {
        Ok(decks) => decks,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, e).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Err(e) = store.save(&cfg) {
        warn!("could not save config to {}: {e}", store.path().display());
    }

    let history = match HistoryDb::new() {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("history disabled: {e}");
            None
        }
    };

    let settings = cli.to_settings(&cfg);
    info!(
        "starting {} drill ({})",
        settings.difficulty,
        settings.tone_mode.label()
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, decks, history);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

/// Decks for this run. A deck named on the command line has to load. A remembered deck that
/// no longer loads is forgotten so the next run is not stuck on it.
fn resolve_decks(cli_deck: Option<&Path>, cfg: &mut Config) -> Result<DeckSet, DeckError> {
    if let Some(path) = cli_deck {
        return DeckSet::from_path(path);
    }

    if let Some(path) = cfg.deck_file.clone() {
        match DeckSet::from_path(&path) {
            Ok(decks) => return Ok(decks),
            Err(e) => {
                warn!("dropping saved deck, using built-in decks: {e}");
                cfg.deck_file = None;
            }
        }
    }

    DeckSet::builtin()
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(EventSource::terminal());
    terminal.draw(|f| ui(app, f))?;

    runner.run(|event| -> Result<Control, Box<dyn Error>> {
        match event {
            DrillEvent::Tick => app.on_tick(Instant::now()),
            DrillEvent::Resize => {}
            DrillEvent::Key(key) => {
                if app.handle_key(key, Instant::now()) == Control::Quit {
                    return Ok(Control::Quit);
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
        Ok(Control::Continue)
    })
}

fn ui(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

fn print_history<W: Write>(db: &HistoryDb, limit: usize, out: &mut W) -> Result<(), Box<dyn Error>> {
    let sessions = db.recent_sessions(limit)?;
    if sessions.is_empty() {
        writeln!(out, "no finished sessions yet")?;
        return Ok(());
    }

    let now = Local::now();
    writeln!(
        out,
        "{:<18} {:<7} {:<11} {:>6}  {}",
        "when", "tier", "tones", "score", "correct/wrong/skipped"
    )?;
    for s in &sessions {
        writeln!(
            out,
            "{:<18} {:<7} {:<11} {:>6}  {}/{}/{}",
            humanize_since(s.finished_at, now),
            s.difficulty.to_string(),
            s.tone_mode.label(),
            s.score,
            s.correct_count,
            s.wrong_count,
            s.skipped_count
        )?;
    }

    let missed = db.most_missed(MISSED_ROWS)?;
    if !missed.is_empty() {
        writeln!(out)?;
        writeln!(out, "most missed:")?;
        for m in &missed {
            writeln!(out, "  {} {} ({}x)", m.prompt, m.display_answer, m.misses)?;
        }
    }

    Ok(())
}
