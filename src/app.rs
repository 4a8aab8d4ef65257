use std::time::Instant;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;

use crate::deck::DeckSet;
use crate::difficulty::{Difficulty, ToneMode};
use crate::history::{HistoryDb, SessionRecord};
use crate::runtime::SecondClock;
use crate::session::{Advance, CardState, Phase, Session, SessionSummary};

const HISTORY_ROWS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Drill,
    Results,
    History,
}

/// What the event loop should do after handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Choices that survive a restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillSettings {
    pub difficulty: Difficulty,
    pub tone_mode: ToneMode,
    pub save_history: bool,
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            tone_mode: ToneMode::Toned,
            save_history: true,
        }
    }
}

/// Best scores shown next to a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Records {
    pub today: Option<u32>,
    pub all_time: Option<u32>,
}

/// Front-end state around a [`Session`]: the answer being typed, screens, persistence
#[derive(Debug)]
pub struct App {
    pub settings: DrillSettings,
    pub session: Session,
    pub decks: DeckSet,
    pub state: AppState,
    pub input: String,
    pub summary: Option<SessionSummary>,
    pub records: Records,
    pub history_rows: Vec<SessionRecord>,
    history: Option<HistoryDb>,
    clock: SecondClock,
}

impl App {
    pub fn new(settings: DrillSettings, decks: DeckSet, history: Option<HistoryDb>) -> Self {
        let mut app = Self {
            settings,
            session: Session::new(),
            decks,
            state: AppState::Drill,
            input: String::new(),
            summary: None,
            records: Records::default(),
            history_rows: vec![],
            history,
            clock: SecondClock::new(Instant::now()),
        };
        app.restart(Instant::now());
        app
    }

    /// Start a fresh session with the current settings
    pub fn restart(&mut self, now: Instant) {
        self.session
            .start(self.settings.difficulty, self.settings.tone_mode, &self.decks);
        self.clock.reset(now);
        self.input.clear();
        self.summary = None;
        self.records = Records::default();
        self.state = AppState::Drill;
    }

    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    /// Feed wall-clock time into the session, one `tick` per elapsed second
    pub fn on_tick(&mut self, now: Instant) {
        if self.state != AppState::Drill || !self.session.is_running() {
            return;
        }

        for _ in 0..self.clock.poll(now) {
            if self.session.tick() == Phase::Ended {
                self.finish();
                break;
            }
        }
    }

    fn finish(&mut self) {
        self.summary = self.session.summary();
        self.state = AppState::Results;

        let Some(summary) = self.summary.as_ref() else {
            return;
        };
        let Some(db) = self.history.as_mut() else {
            return;
        };

        let now = Local::now();
        if self.settings.save_history {
            if let Err(e) = db.record_summary(summary, now) {
                warn!("could not save session: {e}");
            }
        }

        let today = db.best_score_on(summary.difficulty, summary.tone_mode, now.date_naive());
        let all_time = db.best_score(summary.difficulty, summary.tone_mode);
        match (today, all_time) {
            (Ok(today), Ok(all_time)) => self.records = Records { today, all_time },
            (Err(e), _) | (_, Err(e)) => warn!("could not read best scores: {e}"),
        }
    }

    fn load_history(&mut self) {
        if let Some(db) = self.history.as_ref() {
            match db.recent_sessions(HISTORY_ROWS) {
                Ok(rows) => self.history_rows = rows,
                Err(e) => warn!("could not read history: {e}"),
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Control::Quit;
        }

        match self.state {
            AppState::Drill => self.on_drill_key(key),
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.restart(now),
                KeyCode::Char('h') => {
                    self.load_history();
                    self.state = AppState::History;
                }
                _ => {}
            },
            AppState::History => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                KeyCode::Char('r') => self.restart(now),
                _ => {}
            },
        }

        Control::Continue
    }

    fn on_drill_key(&mut self, key: KeyEvent) {
        if !self.session.is_running() {
            return;
        }

        match (self.session.card_state(), key.code) {
            (CardState::Unanswered, KeyCode::Enter) => {
                self.session.submit_answer(&self.input);
            }
            (CardState::Unanswered, KeyCode::Tab) => {
                self.session.skip();
            }
            (CardState::Unanswered, KeyCode::Up) => {
                if let Some(hint) = self.session.hint() {
                    self.input = hint;
                }
            }
            (CardState::Unanswered, KeyCode::Backspace) => {
                self.input.pop();
            }
            (CardState::Unanswered, KeyCode::Char(c)) => {
                self.input.push(c);
            }
            (CardState::Judged, KeyCode::Enter) | (CardState::Judged, KeyCode::Right) => {
                if let Advance::Next(_) = self.session.advance() {
                    self.input.clear();
                }
            }
            _ => {}
        }
    }
}
